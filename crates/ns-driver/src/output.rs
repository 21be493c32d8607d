use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};

/// Appends discarded energies to `<label>.energies`, flushing after every
/// iteration so a crash leaves a valid prefix.
pub struct EnergyTraceWriter {
    file: BufWriter<File>,
}

impl EnergyTraceWriter {
    /// Open (creating if necessary) `<label>.energies` for appending.
    pub fn create(label: &str) -> anyhow::Result<Self> {
        let path = format!("{label}.energies");
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            file: BufWriter::new(file),
        })
    }

    /// Append one iteration's discarded energies (already ascending) and
    /// flush.
    pub fn append_iteration(&mut self, energies: &[f64]) -> anyhow::Result<()> {
        for e in energies {
            writeln!(self.file, "{e}")?;
        }
        self.file.flush()?;
        Ok(())
    }
}

/// Write the final live-set energies to `<label>.replicas_final`, ascending.
pub fn write_final_replicas(label: &str, mut energies: Vec<f64>) -> anyhow::Result<()> {
    energies.sort_by(|a, b| a.partial_cmp(b).expect("non-finite energy in final live set"));
    let path = format!("{label}.replicas_final");
    let mut file = File::create(path)?;
    for e in energies {
        writeln!(file, "{e}")?;
    }
    file.flush()?;
    Ok(())
}
