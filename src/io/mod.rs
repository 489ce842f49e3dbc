pub mod poscar;
pub mod strfile;
