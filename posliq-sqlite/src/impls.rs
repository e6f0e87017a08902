mod conditions;
mod consolidate;
mod identity;
mod imports;
mod ledger;
mod liquidate;
mod preview;
mod stores;
