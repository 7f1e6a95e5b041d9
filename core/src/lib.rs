pub mod db;
pub mod energy;
pub mod error;
pub mod exercisedb;
pub mod ledger;
pub mod models;
pub mod planner;
pub mod service;
pub mod serving;
pub mod trend;
pub mod units;
pub mod usda;
