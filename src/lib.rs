//! Core library for the cmm-report-tools command line application.
//!
//! The library turns a PCDmis measurement export into a filled inspection
//! report template. Workbook IO lives under [`cmm::report::io`], the in-memory
//! sheet model in [`cmm::report::model`], reading the export in
//! [`cmm::report::extract`], laying it out on the template in
//! [`cmm::report::distribute`], and the orchestration under
//! [`cmm::report::run`].

pub mod cmm;

pub use cmm::report::{
    ReportError, Result, config, distribute, error, extract, io, logging, model, run,
};
