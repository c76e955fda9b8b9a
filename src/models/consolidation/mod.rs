pub mod entities;
pub mod requests;
pub mod responses;

pub use entities::{
    ConsolidationInput, PeerCandidate, PeerFilter, PeerScope, TitleFallback,
};
