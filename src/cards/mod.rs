pub mod issuer;
pub mod ledger;
