use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use crate::prelude::*;

/// Path to given test resource
pub fn test_resource(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_resources")
        .join(relative)
}

/// Everything a [Writer] was handed while processing one file
#[derive(Debug, Clone, Default)]
pub struct Capture {
    pub source: Option<Source>,
    pub positions: Vec<(Epoch, (f64, f64, f64), (f64, f64, f64))>,
    pub satellites: Vec<(SV, String, Option<String>)>,
    pub rows: Vec<OutputRow>,
}

impl Capture {
    /// Rows of given satellite, in epoch order
    pub fn rows_of(&self, sv: SV) -> Vec<&OutputRow> {
        self.rows.iter().filter(|row| row.sv == sv).collect()
    }
}

/// In memory [Writer]: captures are moved to the shared list
/// at end of file.
#[derive(Debug, Default)]
pub struct MemoryWriter {
    pub capture: Capture,
    pub done: Rc<RefCell<Vec<Capture>>>,
}

impl Writer for MemoryWriter {
    fn update_position(
        &mut self,
        epoch: Epoch,
        xyz: (f64, f64, f64),
        lbh: (f64, f64, f64),
    ) -> Result<(), Error> {
        self.capture.positions.push((epoch, xyz, lbh));
        Ok(())
    }
    fn update_satellite(
        &mut self,
        sv: SV,
        definition: &str,
        navigation: Option<&str>,
    ) -> Result<(), Error> {
        self.capture.satellites.push((
            sv,
            definition.to_string(),
            navigation.map(|name| name.to_string()),
        ));
        Ok(())
    }
    fn write(&mut self, row: &OutputRow) -> Result<(), Error> {
        self.capture.rows.push(row.clone());
        Ok(())
    }
    fn end_of_file(&mut self) -> Result<(), Error> {
        self.done.borrow_mut().push(std::mem::take(&mut self.capture));
        Ok(())
    }
}

/// Runs a [Pipeline] over given test resources, returns the
/// run report and one [Capture] per processed file.
pub fn run_in_memory(config: Config, files: &[&str]) -> (Report, Vec<Capture>) {
    let files = files
        .iter()
        .map(|file| test_resource(file))
        .collect::<Vec<_>>();
    let done = Rc::new(RefCell::new(Vec::new()));
    let mut pipeline = Pipeline::new(config).unwrap();
    let report = pipeline
        .run(&files, |source| {
            Ok(MemoryWriter {
                capture: Capture {
                    source: Some(source.clone()),
                    ..Default::default()
                },
                done: Rc::clone(&done),
            })
        })
        .unwrap();
    let captures = done.borrow().clone();
    (report, captures)
}

/// Configuration reading navigation files from given resource directory
pub fn config_with_navigation(nav_dir: &str) -> Config {
    Config {
        nav_dir: vec![test_resource(nav_dir)],
        ..Default::default()
    }
}
