use anyhow::Result;

/// One stage of a size sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    /// Zero-based stage position
    pub index: usize,
    /// Vectors inserted during this stage
    pub count: usize,
    /// Vectors inserted through the end of this stage; the result key
    pub cumulative: u64,
}

/// Ordered stages with strictly increasing cumulative sizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sweep {
    stages: Vec<Stage>,
}

impl Sweep {
    pub fn from_counts(counts: &[usize]) -> Result<Self> {
        anyhow::ensure!(!counts.is_empty(), "sweep needs at least one stage");

        let mut cumulative = 0u64;
        let mut stages = Vec::with_capacity(counts.len());
        for (index, &count) in counts.iter().enumerate() {
            anyhow::ensure!(count > 0, "stage {} has zero insertions", index);
            cumulative += count as u64;
            stages.push(Stage {
                index,
                count,
                cumulative,
            });
        }
        Ok(Self { stages })
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn keys(&self) -> Vec<u64> {
        self.stages.iter().map(|s| s.cumulative).collect()
    }

    pub fn total(&self) -> u64 {
        self.stages.last().map_or(0, |s| s.cumulative)
    }
}
