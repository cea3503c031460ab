// ABOUTME: Accumulator for non-fatal warnings raised while deploying or running auxiliary commands.
// ABOUTME: Warnings are logged when recorded and summarized again at the end of a command.

/// Collects non-fatal warnings during an invocation.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, logging it as it arrives.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Number of recorded warnings of `kind`.
    pub fn count(&self, kind: WarningKind) -> usize {
        self.warnings.iter().filter(|w| w.kind == kind).count()
    }
}

/// A non-fatal warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn probe_failure(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::ProbeFailure,
            message: message.into(),
        }
    }

    pub fn inspect_failed(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::InspectFailed,
            message: message.into(),
        }
    }

    pub fn tolerated(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::Tolerated,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// A health probe attempt did not succeed.
    ProbeFailure,
    /// The new container could not be inspected after start.
    InspectFailed,
    /// An engine error that does not affect the outcome, such as stopping a stopped container.
    Tolerated,
}
