use crate::error::{MetricError, ParseError};
use crate::provider::ProcessInfoProvider;

/// Host-wide facts needed to normalize per-process CPU time.
///
/// Read fresh for each operation and passed explicitly, never cached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemContext {
    pub uptime_seconds: f64,
    pub num_logical_cores: usize,
    pub clock_ticks_per_second: u64,
}

impl SystemContext {
    pub fn read<P: ProcessInfoProvider + ?Sized>(provider: &P) -> Result<Self, MetricError> {
        let context = SystemContext {
            uptime_seconds: read_uptime_seconds(provider)?,
            num_logical_cores: read_num_logical_cores(provider)?,
            clock_ticks_per_second: read_clock_ticks_per_second(provider)?,
        };
        context.validate()?;
        Ok(context)
    }

    /// Rejects values that would make a divisor zero or negative.
    pub fn validate(&self) -> Result<(), MetricError> {
        if self.num_logical_cores == 0 {
            return Err(MetricError::NoCores);
        }
        if !(self.uptime_seconds > 0.0) {
            return Err(MetricError::NonPositiveUptime(self.uptime_seconds));
        }
        if self.clock_ticks_per_second == 0 {
            return Err(MetricError::ZeroTickRate);
        }
        Ok(())
    }
}

pub fn read_uptime_seconds<P: ProcessInfoProvider + ?Sized>(
    provider: &P,
) -> Result<f64, MetricError> {
    let raw = provider.uptime()?;
    let field = raw
        .split_whitespace()
        .next()
        .ok_or(ParseError::MissingField("uptime"))?;

    match field.parse::<f64>() {
        Ok(secs) if secs.is_finite() => Ok(secs),
        _ => Err(ParseError::InvalidValue {
            field: "uptime",
            value: field.to_string(),
        }
        .into()),
    }
}

/// Counts `processor` entries in the CPU descriptor. May be zero; callers
/// that divide by it go through `SystemContext::validate`.
pub fn read_num_logical_cores<P: ProcessInfoProvider + ?Sized>(
    provider: &P,
) -> Result<usize, MetricError> {
    let cpuinfo = provider.cpu_descriptor()?;
    Ok(cpuinfo.lines().filter(|line| is_processor_entry(line)).count())
}

fn is_processor_entry(line: &str) -> bool {
    line.strip_prefix("processor")
        .is_some_and(|rest| rest.starts_with(|c: char| c == ':' || c.is_whitespace()))
}

pub fn read_clock_ticks_per_second<P: ProcessInfoProvider + ?Sized>(
    provider: &P,
) -> Result<u64, MetricError> {
    match provider.clock_ticks_per_second() {
        0 => Err(MetricError::ZeroTickRate),
        hz => Ok(hz),
    }
}
