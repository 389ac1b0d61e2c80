//! Reporting sinks. The driver only knows the acceptor traits; files,
//! stdout and test buffers are interchangeable implementations. The
//! NDJSON sink is the flight recorder: one line per settled hand,
//! flushed as written so a crashed run keeps everything before it.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::simulation::stats::SimulationResult;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShoeState {
    pub cards_remaining: usize,
    pub true_count: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionContext {
    pub player_total: u8,
    pub dealer_up: String,
    pub action_taken: String,
    pub baseline_action: String,
    pub deviation_trigger: Option<String>,
    pub true_count: f64,
    pub deviated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutcomeRecord {
    pub pnl: f64,
    pub result: String,
}

/// One flight-recorder line. Field names are the wire contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HandRecord {
    pub session_id: String,
    pub config_id: String,
    pub hand_id: String,
    pub shoe_state: ShoeState,
    pub decision_context: DecisionContext,
    pub outcome: OutcomeRecord,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Per-hand record acceptor.
pub trait HandRecordSink {
    fn accept(&mut self, record: &HandRecord) -> Result<(), EngineError>;
}

/// Summary acceptor.
pub trait SummarySink {
    fn accept_summary(&mut self, result: &SimulationResult);
}

/// Sink that drops everything; used when tracing is off.
pub struct NullSink;

impl HandRecordSink for NullSink {
    fn accept(&mut self, _record: &HandRecord) -> Result<(), EngineError> {
        Ok(())
    }
}

/// Newline-delimited JSON over any writer.
pub struct NdjsonSink<W: Write> {
    writer: W,
}

impl<W: Write> NdjsonSink<W> {
    pub fn new(writer: W) -> NdjsonSink<W> {
        NdjsonSink { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> HandRecordSink for NdjsonSink<W> {
    fn accept(&mut self, record: &HandRecord) -> Result<(), EngineError> {
        let line = serde_json::to_string(record)
            .map_err(|e| EngineError::Trace(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> HandRecord {
        HandRecord {
            session_id: "run-002a".to_string(),
            config_id: "BASELINE".to_string(),
            hand_id: "run-002a-00000001".to_string(),
            shoe_state: ShoeState {
                cards_remaining: 280,
                true_count: round2(1.2345),
            },
            decision_context: DecisionContext {
                player_total: 16,
                dealer_up: "TD".to_string(),
                action_taken: "STAND".to_string(),
                baseline_action: "HIT".to_string(),
                deviation_trigger: Some("ILL_16v10".to_string()),
                true_count: 1.2345,
                deviated: true,
            },
            outcome: OutcomeRecord {
                pnl: round2(-10.0),
                result: "LOSS".to_string(),
            },
        }
    }

    #[test]
    fn ndjson_sink_writes_one_line_per_record() {
        let mut sink = NdjsonSink::new(Vec::new());
        sink.accept(&sample_record()).unwrap();
        sink.accept(&sample_record()).unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out.lines().count(), 2);
    }

    #[test]
    fn record_round_trips_with_wire_field_names() {
        let mut sink = NdjsonSink::new(Vec::new());
        let record = sample_record();
        sink.accept(&record).unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        let line = out.lines().next().unwrap();

        assert!(line.contains("\"session_id\""));
        assert!(line.contains("\"shoe_state\""));
        assert!(line.contains("\"decision_context\""));
        assert!(line.contains("\"deviation_trigger\""));
        assert!(line.contains("\"ILL_16v10\""));

        let parsed: HandRecord = serde_json::from_str(line).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn shoe_true_count_is_rounded_to_cents() {
        assert_eq!(round2(1.2345), 1.23);
        assert_eq!(round2(-0.005), -0.01);
        assert_eq!(round2(2.0), 2.0);
    }

    #[test]
    fn null_deviation_serializes_as_json_null() {
        let mut record = sample_record();
        record.decision_context.deviation_trigger = None;
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"deviation_trigger\":null"));
    }
}
