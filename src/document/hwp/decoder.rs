//! Structural decoders for legacy documents
//!
//! The compound-document container is never opened here. A decoder hands
//! back a [`DocumentRecordStream`]; the bundled [`CommandDecoder`] obtains it
//! from an external program that prints one JSON object per line.

use serde_json::{Map, Value};
use std::path::Path;
use std::process::Command;

use super::records::{CharStyle, DocumentRecordStream, NumberingRef, ParagraphStyle, Record};
use super::strategies;
use crate::document::models::TextAlignment;
use crate::error::{Error, Result};

/// Placeholder in a decoder command line replaced by the document path
pub const PATH_PLACEHOLDER: &str = "{path}";

/// How many empty sections a `"section"` number may skip ahead
const MAX_SECTION_GAP: usize = 256;

pub trait StructuralDecoder {
    fn decode(&self, path: &Path) -> Result<DocumentRecordStream>;
}

/// Runs an external decoder and parses its JSON Lines output
#[derive(Debug, Clone)]
pub struct CommandDecoder {
    argv: Vec<String>,
}

impl CommandDecoder {
    pub fn new(argv: Vec<String>) -> Result<Self> {
        if argv.is_empty() {
            return Err(Error::DecoderUnavailable("empty decoder command".to_string()));
        }
        Ok(Self { argv })
    }

    fn command_for(&self, path: &Path) -> Command {
        let path_arg = path.to_string_lossy();
        let mut command = Command::new(&self.argv[0]);
        let mut substituted = false;

        for arg in &self.argv[1..] {
            if arg.contains(PATH_PLACEHOLDER) {
                command.arg(arg.replace(PATH_PLACEHOLDER, &path_arg));
                substituted = true;
            } else {
                command.arg(arg);
            }
        }
        if !substituted {
            command.arg(path);
        }
        command
    }
}

impl StructuralDecoder for CommandDecoder {
    fn decode(&self, path: &Path) -> Result<DocumentRecordStream> {
        log::info!("decoding {} with {}", path.display(), self.argv[0]);

        let output = self.command_for(path).output().map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                Error::DecoderUnavailable(format!("{}: {err}", self.argv[0]))
            } else {
                Error::Io(err)
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Decode(format!(
                "{} exited with {}: {}",
                self.argv[0],
                output.status,
                stderr.trim()
            )));
        }

        parse_record_lines(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Stand-in used when no decoder command is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredDecoder;

impl StructuralDecoder for UnconfiguredDecoder {
    fn decode(&self, _path: &Path) -> Result<DocumentRecordStream> {
        Err(Error::DecoderUnavailable(
            "no structural decoder command configured".to_string(),
        ))
    }
}

/// Decoder for an optional configured command line
pub fn decoder_for_command(argv: Option<&[String]>) -> Box<dyn StructuralDecoder> {
    match argv.map(|argv| CommandDecoder::new(argv.to_vec())) {
        Some(Ok(decoder)) => Box::new(decoder),
        _ => Box::new(UnconfiguredDecoder),
    }
}

/// Parse decoder output, one JSON object per non-blank line.
///
/// A line is either a record in tagged form (`{"kind": ...}`) or a raw model
/// `{"type": ..., "content": ...}`. An optional `"section"` number on any line
/// routes it to that section; lines without one extend the latest section.
/// Raw models of unknown type are skipped.
pub fn parse_record_lines(output: &str) -> Result<DocumentRecordStream> {
    let mut stream = DocumentRecordStream::default();
    let mut current_section = 0;

    for (line_no, line) in output.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let value: Value = serde_json::from_str(line)
            .map_err(|err| Error::Decode(format!("line {}: {err}", line_no + 1)))?;
        let Value::Object(mut object) = value else {
            return Err(Error::Decode(format!("line {}: expected an object", line_no + 1)));
        };

        if let Some(section) = object.remove("section").and_then(|s| s.as_u64()) {
            current_section = usize::try_from(section)
                .ok()
                .filter(|index| *index <= stream.section_count() + MAX_SECTION_GAP)
                .ok_or_else(|| {
                    Error::Decode(format!(
                        "line {}: section {section} is out of sequence after {} sections",
                        line_no + 1,
                        stream.section_count()
                    ))
                })?;
        }

        let record = if object.contains_key("kind") {
            let record = serde_json::from_value::<Record>(Value::Object(object))
                .map_err(|err| Error::Decode(format!("line {}: {err}", line_no + 1)))?;
            Some(record)
        } else {
            classify_model(&object)
        };

        let section = stream.section_mut(current_section);
        if let Some(record) = record {
            section.push(record);
        }
    }

    Ok(stream)
}

/// Map one raw decoder model to a record by its type name
pub fn classify_model(model: &Map<String, Value>) -> Option<Record> {
    let model_type = model.get("type").map(type_name).unwrap_or_default();
    let empty = Value::Object(Map::new());
    let content = model.get("content").unwrap_or(&empty);

    if model_type.contains("ParaHeader") {
        Some(Record::ParagraphStart)
    } else if model_type.contains("ParaText") {
        strategies::extract_text(content).map(Record::text)
    } else if model_type.contains("CharShape") {
        let style = serde_json::from_value::<CharStyle>(content.clone()).unwrap_or_default();
        Some(Record::CharStyle(style))
    } else if model_type.contains("ParaShape") {
        Some(Record::ParagraphStyle(paragraph_style(content)))
    } else if model_type.contains("TableControl") {
        Some(Record::TableBegin)
    } else if model_type.contains("TableBody") {
        Some(Record::TableBody {
            rows: count(content, "rows"),
            cols: count(content, "cols"),
        })
    } else if model_type.contains("TableCell") {
        Some(Record::TableCell {
            row: count(content, "row"),
            col: count(content, "col"),
        })
    } else if model_type.contains("Picture") {
        Some(Record::Image {
            width: dimension(content, "width"),
            height: dimension(content, "height"),
            binary_ref: ["binary_ref", "bindata_id", "bin_item"]
                .iter()
                .find_map(|key| content.get(*key).and_then(scalar_string)),
        })
    } else {
        log::trace!("skipping model {model_type}");
        None
    }
}

fn type_name(value: &Value) -> String {
    match value {
        Value::String(name) => name.clone(),
        other => other.to_string(),
    }
}

fn paragraph_style(content: &Value) -> ParagraphStyle {
    let alignment = ["alignment", "align"]
        .iter()
        .find_map(|key| content.get(*key)?.as_str())
        .and_then(TextAlignment::from_name)
        .unwrap_or_default();
    let indent = content
        .get("indent")
        .and_then(Value::as_i64)
        .and_then(|v| i32::try_from(v).ok())
        .unwrap_or(0);
    let numbering = content
        .get("numbering")
        .and_then(|n| serde_json::from_value::<NumberingRef>(n.clone()).ok());

    ParagraphStyle {
        alignment,
        indent,
        numbering,
    }
}

fn count(content: &Value, key: &str) -> usize {
    content
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(0)
}

fn dimension(content: &Value, key: &str) -> Option<u32> {
    content
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
