pub mod lead;
pub mod loja;
pub mod veiculo;

pub use lead::Lead;
pub use loja::{DadosContato, Loja, LojaPublica};
pub use veiculo::{Veiculo, STATUS_DISPONIVEL};
