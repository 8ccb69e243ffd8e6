//! Gross-to-net payroll engine
//!
//! This crate turns an employee's pay for a period into a paystub: gross pay
//! from salary or hours, pre-tax and post-tax deductions, federal bracket
//! withholding, Social Security and Medicare with their wage caps and surtax,
//! state tax, and the year-to-date ledger each run updates.
//!
//! The [`calculation`] functions are pure and record every decision in an
//! audit trace. [`service::PayrollService`] runs them against a
//! [`repository::PayrollRepository`] and the tax policy of the pay date's
//! year, committing each paystub together with its ledger update.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod repository;
pub mod service;
