//! Reading particle tables and writing result tables. Everything is CSV with a header row.

use crate::ensemble::Ensemble;
use crate::error::{Result, SimulationError};
use crate::{Scalar, Vec3};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

const POSITION_COLUMNS: [&str; 3] = ["x", "y", "z"];

/// A named table of particle positions, waiting to be read.
pub struct TableSource<R> {
    name: String,
    reader: R,
}

impl TableSource<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let reader = File::open(path).map_err(|e| SimulationError::source_read(&name, e))?;
        Ok(Self { name, reader })
    }
}

impl<R: Read> TableSource<R> {
    pub fn new(name: impl Into<String>, reader: R) -> Self {
        Self {
            name: name.into(),
            reader,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reads the `x, y, z` columns of every row, in order. Column names are matched after
    /// trimming surrounding whitespace, and any other columns are ignored.
    pub fn read_positions(self) -> Result<Vec<Vec3>> {
        let name = self.name;
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(self.reader);

        let headers = reader
            .headers()
            .map_err(|e| SimulationError::source_read(&name, e))?
            .clone();

        let mut columns = [0; 3];
        for (column, label) in columns.iter_mut().zip(POSITION_COLUMNS.iter()) {
            *column = headers
                .iter()
                .position(|h| h == *label)
                .ok_or_else(|| {
                    SimulationError::source_read(&name, format!("missing column `{}`", label))
                })?;
        }

        let mut positions = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(|e| SimulationError::source_read(&name, e))?;

            let mut position = Vec3::zeros();
            for (axis, &column) in columns.iter().enumerate() {
                let field = record.get(column).unwrap_or("");
                position[axis] = field.parse::<Scalar>().map_err(|e| {
                    SimulationError::source_read(
                        &name,
                        format!(
                            "row {}: column `{}` value {:?} is not a number ({})",
                            row + 1,
                            POSITION_COLUMNS[axis],
                            field,
                            e
                        ),
                    )
                })?;

                if !position[axis].is_finite() {
                    return Err(SimulationError::source_read(
                        &name,
                        format!(
                            "row {}: column `{}` value {:?} is not finite",
                            row + 1,
                            POSITION_COLUMNS[axis],
                            field
                        ),
                    ));
                }
            }
            positions.push(position);
        }

        tracing::debug!("Read {} particles from {}", positions.len(), name);
        Ok(positions)
    }
}

/// Writes one row per particle, `x, y, z, vx, vy, vz`, in ensemble order (matter first). With
/// `include_population` a trailing `population` column tags each row.
pub fn write_results<W: Write>(
    ensemble: &Ensemble,
    writer: W,
    include_population: bool,
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);

    let mut header = vec!["x", "y", "z", "vx", "vy", "vz"];
    if include_population {
        header.push("population");
    }
    writer
        .write_record(&header)
        .map_err(SimulationError::sink_write)?;

    let particles = ensemble.particles();
    for (i, (x, v)) in particles
        .positions()
        .iter()
        .zip(particles.velocities())
        .enumerate()
    {
        let mut record: Vec<String> = x.iter().chain(v.iter()).map(|c| c.to_string()).collect();
        if include_population {
            record.push(ensemble.population(i).as_str().to_owned());
        }
        writer
            .write_record(&record)
            .map_err(SimulationError::sink_write)?;
    }

    writer.flush().map_err(SimulationError::sink_write)?;
    Ok(())
}

/// Writes an `x, y, z` table that [`TableSource::read_positions`] can read back.
pub fn write_positions<W: Write>(positions: &[Vec3], writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer
        .write_record(&POSITION_COLUMNS)
        .map_err(SimulationError::sink_write)?;

    for x in positions {
        writer
            .write_record(x.iter().map(|c| c.to_string()))
            .map_err(SimulationError::sink_write)?;
    }

    writer.flush().map_err(SimulationError::sink_write)?;
    Ok(())
}
