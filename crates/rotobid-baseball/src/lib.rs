// Auction valuation engine for rotisserie baseball: player pool, z-score
// valuation, live inflation, roto standings and the draft session.

pub mod draft;
pub mod player;
pub mod projections;
pub mod roto;
pub mod valuation;
