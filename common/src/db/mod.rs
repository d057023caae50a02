pub mod fabric;
pub mod indices;
pub mod netlist;
pub mod parser;
pub mod selection;
