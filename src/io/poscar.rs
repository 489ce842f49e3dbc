use std::fs;
use std::io;
use std::path::Path;

use nalgebra::Point3;

use crate::core::domain::Structure;

fn push_cell(out: &mut String, s: &Structure) {
    for axis in 0..3 {
        let v = s.cell.vector(axis);
        out.push_str(&format!("  {:>15.9} {:>15.9} {:>15.9}\n", v.x, v.y, v.z));
    }
}

fn push_position(out: &mut String, p: &Point3<f64>) {
    out.push_str(&format!("  {:>15.9} {:>15.9} {:>15.9}\n", p.x, p.y, p.z));
}

/// Renders the VASP-style POSCAR snapshot: species-symbol and count lines
/// cover metallic then interstitial species (zero-count species dropped),
/// positions grouped by species, empty interstitial sites omitted.
pub fn render_poscar(s: &Structure) -> String {
    let mut out = String::new();
    out.push_str(&s.title());
    out.push('\n');
    out.push_str("1.0\n");
    push_cell(&mut out, s);

    let mut symbols = Vec::new();
    let mut counts = Vec::new();
    for i in 0..s.metal.len() {
        if s.metal.counts[i] > 0 {
            symbols.push(s.metal.symbol(i).to_string());
            counts.push(s.metal.counts[i].to_string());
        }
    }
    for i in 0..s.inter.len() {
        if s.inter.counts[i] > 0 {
            symbols.push(s.inter.symbol(i).to_string());
            counts.push(s.inter.counts[i].to_string());
        }
    }
    out.push_str(&symbols.join(" "));
    out.push('\n');
    out.push_str(&counts.join(" "));
    out.push('\n');
    out.push_str("Cartesian\n");

    for species in 0..s.metal.len() {
        for atom in s.atoms.iter().filter(|a| a.species == species) {
            push_position(&mut out, &atom.position);
        }
    }
    for species in 0..s.inter.len() {
        for site in s.sites.iter().filter(|t| t.occupation == Some(species)) {
            push_position(&mut out, &site.position);
        }
    }
    out
}

/// Renders the SAVE snapshot, a superset of POSCAR that round-trips through
/// the strfile parser: full inventories, total site count, occupied sites
/// grouped by species, empty sites last so the site count survives a reload.
pub fn render_save(s: &Structure) -> String {
    let mut out = String::new();
    out.push_str(&s.title());
    out.push('\n');
    out.push_str("1.0\n");
    push_cell(&mut out, s);

    let metal_symbols: Vec<_> = (0..s.metal.len()).map(|i| s.metal.symbol(i)).collect();
    let metal_counts: Vec<_> = s.metal.counts.iter().map(|c| c.to_string()).collect();
    let inter_symbols: Vec<_> = (0..s.inter.len()).map(|i| s.inter.symbol(i)).collect();
    let inter_counts: Vec<_> = s.inter.counts.iter().map(|c| c.to_string()).collect();

    out.push('\n');
    out.push_str(&metal_symbols.join(" "));
    out.push('\n');
    out.push_str(&metal_counts.join(" "));
    out.push('\n');
    out.push('\n');
    out.push_str(&inter_symbols.join(" "));
    out.push('\n');
    out.push_str(&inter_counts.join(" "));
    out.push('\n');
    out.push_str(&format!("{}\n", s.num_sites()));
    out.push_str("No Shuffle\n");
    out.push_str("Cartesian\n");

    for species in 0..s.metal.len() {
        for atom in s.atoms.iter().filter(|a| a.species == species) {
            push_position(&mut out, &atom.position);
        }
    }
    for species in 0..s.inter.len() {
        for site in s.sites.iter().filter(|t| t.occupation == Some(species)) {
            push_position(&mut out, &site.position);
        }
    }
    for site in s.sites.iter().filter(|t| t.occupation.is_none()) {
        push_position(&mut out, &site.position);
    }
    out
}

pub fn write_poscar(s: &Structure, path: &Path) -> io::Result<()> {
    fs::write(path, render_poscar(s))
}

pub fn write_save(s: &Structure, path: &Path) -> io::Result<()> {
    fs::write(path, render_save(s))
}
