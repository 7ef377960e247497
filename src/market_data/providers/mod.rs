pub mod tinvest;

pub use tinvest::TInvestClient;
