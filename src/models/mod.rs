// src/models/mod.rs
pub mod kitten;

pub use kitten::{
    GetKittensQuery,
    GetKittensResponse,
    RelayResponse,
    SetKittensRequest,
    SetKittensResponse,
    TxId,
};
