use std::fs;
use std::path::Path;

use nalgebra::{Point3, Vector3};
use rand::Rng;
use thiserror::Error;

use crate::core::domain::{Cell, InterSite, MetalAtom, SpeciesInventory, Structure};
use crate::core::elements;

#[derive(Debug, Error)]
pub enum StrfileError {
    #[error("cannot read structure file: {0}")]
    Io(#[from] std::io::Error),
    #[error("structure file truncated: missing {0}")]
    Truncated(&'static str),
    #[error("malformed {0}: {1:?}")]
    Malformed(&'static str, String),
    #[error("unknown element symbol {0:?}")]
    UnknownElement(String),
}

/// Outcome of a parse: the structure plus whether the file asked for the
/// one-shot shuffle initializer.
#[derive(Debug, Clone)]
pub struct ParsedStructure {
    pub structure: Structure,
    pub shuffle: bool,
}

struct Cursor<'a> {
    lines: std::str::Lines<'a>,
}

impl<'a> Cursor<'a> {
    fn next(&mut self, what: &'static str) -> Result<&'a str, StrfileError> {
        self.lines.next().ok_or(StrfileError::Truncated(what))
    }
}

fn parse_f64(token: &str, what: &'static str) -> Result<f64, StrfileError> {
    let value: f64 = token
        .parse()
        .map_err(|_| StrfileError::Malformed(what, token.to_string()))?;
    if !value.is_finite() {
        return Err(StrfileError::Malformed(what, token.to_string()));
    }
    Ok(value)
}

fn parse_vec3(line: &str, what: &'static str) -> Result<Vector3<f64>, StrfileError> {
    let mut tokens = line.split_whitespace();
    let mut out = [0.0; 3];
    for slot in &mut out {
        let token = tokens
            .next()
            .ok_or_else(|| StrfileError::Malformed(what, line.to_string()))?;
        *slot = parse_f64(token, what)?;
    }
    Ok(Vector3::new(out[0], out[1], out[2]))
}

/// Reads one species inventory block: a discarded separator line, the
/// symbols line, then the counts line.
fn parse_inventory(
    cur: &mut Cursor,
    block: &'static str,
) -> Result<SpeciesInventory, StrfileError> {
    let _ = cur.next(block)?;

    let mut inventory = SpeciesInventory::default();
    for symbol in cur.next(block)?.split_whitespace() {
        let z = elements::atomic_number(symbol)
            .ok_or_else(|| StrfileError::UnknownElement(symbol.to_string()))?;
        inventory.elements.push(z);
    }
    for token in cur.next(block)?.split_whitespace() {
        let count: usize = token
            .parse()
            .map_err(|_| StrfileError::Malformed(block, token.to_string()))?;
        inventory.counts.push(count);
    }
    if inventory.counts.len() != inventory.elements.len() {
        return Err(StrfileError::Malformed(
            block,
            format!(
                "{} symbols but {} counts",
                inventory.elements.len(),
                inventory.counts.len()
            ),
        ));
    }
    Ok(inventory)
}

fn read_position(
    cur: &mut Cursor,
    cartesian: bool,
    scale: f64,
    cell: &Cell,
    what: &'static str,
) -> Result<Point3<f64>, StrfileError> {
    let v = parse_vec3(cur.next(what)?, what)?;
    if cartesian {
        Ok(Point3::from(v * scale))
    } else {
        Ok(cell.to_cartesian(&Point3::from(v)))
    }
}

/// Parses the fixed-order structure record. Both the hand-written input
/// format and the emitted SAVE format go through here.
pub fn parse_str(text: &str) -> Result<ParsedStructure, StrfileError> {
    let mut cur = Cursor { lines: text.lines() };

    let _title = cur.next("title line")?;
    let scale = parse_f64(cur.next("scale factor")?.trim(), "scale factor")?;

    let mut vectors = [Vector3::zeros(); 3];
    for v in &mut vectors {
        *v = parse_vec3(cur.next("cell vector")?, "cell vector")? * scale;
    }
    let cell = Cell::new(vectors[0], vectors[1], vectors[2]);

    let metal = parse_inventory(&mut cur, "metallic species block")?;
    let inter = parse_inventory(&mut cur, "interstitial species block")?;

    let total_line = cur.next("interstitial site total")?;
    let num_sites: usize = total_line.trim().parse().map_err(|_| {
        StrfileError::Malformed("interstitial site total", total_line.to_string())
    })?;
    if num_sites < inter.total() {
        return Err(StrfileError::Malformed(
            "interstitial site total",
            format!("{} sites cannot hold {} atoms", num_sites, inter.total()),
        ));
    }

    let shuffle = cur.next("shuffle flag")?.trim() == "Shuffle";
    let cartesian = matches!(
        cur.next("coordinate mode")?.trim().chars().next(),
        Some('C') | Some('c') | Some('K') | Some('k')
    );

    // Metallic positions arrive grouped by species in inventory order.
    let mut atoms = Vec::with_capacity(metal.total());
    for (species, &count) in metal.counts.iter().enumerate() {
        for _ in 0..count {
            let position = read_position(&mut cur, cartesian, scale, &cell, "atom position")?;
            atoms.push(MetalAtom { position, species });
        }
    }

    let mut sites = Vec::with_capacity(num_sites);
    for _ in 0..num_sites {
        let position = read_position(&mut cur, cartesian, scale, &cell, "site position")?;
        sites.push(InterSite {
            position,
            occupation: None,
        });
    }

    let mut structure = Structure {
        cell,
        metal,
        inter,
        atoms,
        sites,
    };
    structure.fill_occupations();

    Ok(ParsedStructure { structure, shuffle })
}

pub fn parse(path: &Path) -> Result<ParsedStructure, StrfileError> {
    let text = fs::read_to_string(path)?;
    parse_str(&text)
}

/// Parses `path` and runs the shuffle initializer when the file asks for it.
pub fn load<R: Rng + ?Sized>(path: &Path, rng: &mut R) -> Result<Structure, StrfileError> {
    let parsed = parse(path)?;
    let mut structure = parsed.structure;
    if parsed.shuffle {
        structure.shuffle(rng);
    }
    Ok(structure)
}
