pub mod autophase;
pub mod processing;
