#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::type_complexity)]

#[macro_use]
extern crate lazy_static;

pub mod config;
pub mod constants;
pub mod epoch;
pub mod error;
pub mod filename;
pub mod geodesy;
pub mod header;
pub mod navigation;
pub mod observable;
pub mod observation;
pub mod orbit;
pub mod output;
pub mod pipeline;
pub mod reader;
pub mod system;
pub mod tec;
pub mod validity;
pub mod version;
pub mod xyz;

mod columns;

#[cfg(test)]
mod tests;

/// Package to include all basic structures
pub mod prelude {
    pub use crate::{
        config::{Config, NavPriority, OutFileMode},
        epoch::{Date, EpochFlag, TimeOfDay},
        error::{ArithmeticError, Error, ParsingError},
        header::{Header, ObservableCatalog},
        navigation::{Ephemeris, EphemerisStore, NavigationFile},
        observable::{Observable, Observables},
        observation::{ObsValue, ObservationFile, ObservationRecord},
        output::{Field, Layout, OutputRow, Writer},
        pipeline::{Pipeline, Report, Source},
        tec::{Combination, Frequencies, TecEngine, TecValues},
        validity::Validity,
        version::Version,
    };

    // pub re-export
    pub use gnss_rs::prelude::{Constellation, SV};
    pub use hifitime::{Duration, Epoch, TimeScale};
}
