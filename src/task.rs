//! Typed generator task records.
//!
//! A picked file becomes the input of one generator. Each generator has its
//! own fixed record shape. Stored records are mapped back explicitly and
//! validated rather than read as loose JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::format::TargetFormat;
use crate::repository::RepositoryRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorKind {
    DataWeave,
    Integration,
    Diagram,
    SampleData,
    MUnit,
}

impl GeneratorKind {
    pub const ALL: [GeneratorKind; 5] = [
        GeneratorKind::DataWeave,
        GeneratorKind::Integration,
        GeneratorKind::Diagram,
        GeneratorKind::SampleData,
        GeneratorKind::MUnit,
    ];

    /// The file type this generator usually takes as input.
    pub fn default_format(self) -> TargetFormat {
        match self {
            GeneratorKind::DataWeave => TargetFormat::Json,
            GeneratorKind::Integration => TargetFormat::Raml,
            GeneratorKind::Diagram => TargetFormat::Xml,
            GeneratorKind::SampleData => TargetFormat::Raml,
            GeneratorKind::MUnit => TargetFormat::Xml,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            GeneratorKind::DataWeave => "data_weave",
            GeneratorKind::Integration => "integration",
            GeneratorKind::Diagram => "diagram",
            GeneratorKind::SampleData => "sample_data",
            GeneratorKind::MUnit => "m_unit",
        }
    }
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for GeneratorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        GeneratorKind::ALL
            .into_iter()
            .find(|kind| kind.tag().replace('_', "") == wanted)
            .ok_or_else(|| format!("unknown generator '{s}'"))
    }
}

/// Where a task's input came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub repository: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "generator", rename_all = "snake_case")]
pub enum GeneratorTask {
    DataWeave {
        source: SourceRef,
        input_format: TargetFormat,
        sample_input: String,
    },
    Integration {
        source: SourceRef,
        api_spec: String,
    },
    Diagram {
        source: SourceRef,
        flow_xml: String,
    },
    SampleData {
        source: SourceRef,
        schema: String,
        record_count: u32,
    },
    #[serde(rename = "m_unit")]
    MUnit {
        source: SourceRef,
        flow_xml: String,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("record is not an object")]
    NotAnObject,

    #[error("record has no 'generator' tag")]
    MissingTag,

    #[error("unknown generator '{0}'")]
    UnknownGenerator(String),

    #[error("{generator} record: field '{field}' is missing or has the wrong type")]
    BadField { generator: String, field: String },

    #[error("{generator} record: '{value}' is not a valid input format")]
    BadFormat { generator: String, value: String },
}

pub const DEFAULT_RECORD_COUNT: u32 = 10;

impl GeneratorTask {
    /// Build the task for a file picked in `repo`.
    pub fn from_selection(
        kind: GeneratorKind,
        repo: &RepositoryRef,
        path: &str,
        content: &str,
    ) -> GeneratorTask {
        let source = SourceRef {
            repository: repo.id(),
            path: path.to_string(),
        };
        let content = content.to_string();
        match kind {
            GeneratorKind::DataWeave => GeneratorTask::DataWeave {
                input_format: TargetFormat::ALL
                    .into_iter()
                    .filter(|f| !matches!(f, TargetFormat::DataWeave | TargetFormat::Raml))
                    .find(|f| f.matches(path))
                    .unwrap_or(kind.default_format()),
                source,
                sample_input: content,
            },
            GeneratorKind::Integration => GeneratorTask::Integration {
                source,
                api_spec: content,
            },
            GeneratorKind::Diagram => GeneratorTask::Diagram {
                source,
                flow_xml: content,
            },
            GeneratorKind::SampleData => GeneratorTask::SampleData {
                source,
                schema: content,
                record_count: DEFAULT_RECORD_COUNT,
            },
            GeneratorKind::MUnit => GeneratorTask::MUnit {
                source,
                flow_xml: content,
            },
        }
    }

    pub fn kind(&self) -> GeneratorKind {
        match self {
            GeneratorTask::DataWeave { .. } => GeneratorKind::DataWeave,
            GeneratorTask::Integration { .. } => GeneratorKind::Integration,
            GeneratorTask::Diagram { .. } => GeneratorKind::Diagram,
            GeneratorTask::SampleData { .. } => GeneratorKind::SampleData,
            GeneratorTask::MUnit { .. } => GeneratorKind::MUnit,
        }
    }

    pub fn source(&self) -> &SourceRef {
        match self {
            GeneratorTask::DataWeave { source, .. }
            | GeneratorTask::Integration { source, .. }
            | GeneratorTask::Diagram { source, .. }
            | GeneratorTask::SampleData { source, .. }
            | GeneratorTask::MUnit { source, .. } => source,
        }
    }

    /// Map a stored record onto its variant, checking each field.
    ///
    /// Older records may lack `record_count`; it defaults to
    /// `DEFAULT_RECORD_COUNT`.
    pub fn from_stored(record: &Value) -> Result<GeneratorTask, TaskError> {
        let obj = record.as_object().ok_or(TaskError::NotAnObject)?;
        let tag = obj
            .get("generator")
            .and_then(Value::as_str)
            .ok_or(TaskError::MissingTag)?;
        let kind = GeneratorKind::ALL
            .into_iter()
            .find(|k| k.tag() == tag)
            .ok_or_else(|| TaskError::UnknownGenerator(tag.to_string()))?;

        let text = |field: &str| -> Result<String, TaskError> {
            obj.get(field)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| TaskError::BadField {
                    generator: tag.to_string(),
                    field: field.to_string(),
                })
        };
        let source = {
            let bad = || TaskError::BadField {
                generator: tag.to_string(),
                field: "source".to_string(),
            };
            let src = obj.get("source").and_then(Value::as_object).ok_or_else(bad)?;
            SourceRef {
                repository: src
                    .get("repository")
                    .and_then(Value::as_str)
                    .ok_or_else(bad)?
                    .to_string(),
                path: src.get("path").and_then(Value::as_str).ok_or_else(bad)?.to_string(),
            }
        };

        Ok(match kind {
            GeneratorKind::DataWeave => {
                let raw = text("input_format")?;
                let input_format =
                    TargetFormat::from_token(&raw).ok_or_else(|| TaskError::BadFormat {
                        generator: tag.to_string(),
                        value: raw.clone(),
                    })?;
                GeneratorTask::DataWeave {
                    source,
                    input_format,
                    sample_input: text("sample_input")?,
                }
            }
            GeneratorKind::Integration => GeneratorTask::Integration {
                source,
                api_spec: text("api_spec")?,
            },
            GeneratorKind::Diagram => GeneratorTask::Diagram {
                source,
                flow_xml: text("flow_xml")?,
            },
            GeneratorKind::SampleData => {
                let record_count = match obj.get("record_count") {
                    None | Some(Value::Null) => DEFAULT_RECORD_COUNT,
                    Some(v) => v
                        .as_u64()
                        .and_then(|n| u32::try_from(n).ok())
                        .ok_or_else(|| TaskError::BadField {
                            generator: tag.to_string(),
                            field: "record_count".to_string(),
                        })?,
                };
                GeneratorTask::SampleData {
                    source,
                    schema: text("schema")?,
                    record_count,
                }
            }
            GeneratorKind::MUnit => GeneratorTask::MUnit {
                source,
                flow_xml: text("flow_xml")?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn repo() -> RepositoryRef {
        RepositoryRef::new("acme", "flows", "main")
    }

    #[test]
    fn dataweave_task_detects_input_format_from_extension() {
        let task = GeneratorTask::from_selection(
            GeneratorKind::DataWeave,
            &repo(),
            "samples/order.csv",
            "id,qty",
        );
        assert_eq!(
            task,
            GeneratorTask::DataWeave {
                source: SourceRef {
                    repository: "acme/flows@main".to_string(),
                    path: "samples/order.csv".to_string(),
                },
                input_format: TargetFormat::Csv,
                sample_input: "id,qty".to_string(),
            }
        );
    }

    #[test]
    fn dataweave_task_from_script_or_api_spec_uses_default_input() {
        for path in ["src/dwl/map.dwl", "api/orders.raml", "notes.txt"] {
            let task = GeneratorTask::from_selection(GeneratorKind::DataWeave, &repo(), path, "");
            assert!(
                matches!(task, GeneratorTask::DataWeave { input_format: TargetFormat::Json, .. }),
                "{path}: {task:?}"
            );
        }
    }

    #[test]
    fn serialized_task_maps_back_through_from_stored() {
        for kind in GeneratorKind::ALL {
            let task = GeneratorTask::from_selection(kind, &repo(), "api/spec.raml", "#%RAML 1.0");
            let stored = serde_json::to_value(&task).unwrap();
            assert_eq!(stored["generator"], kind.tag());
            assert_eq!(GeneratorTask::from_stored(&stored), Ok(task));
        }
    }

    #[test]
    fn missing_fields_are_reported() {
        let record = json!({
            "generator": "diagram",
            "source": {"repository": "acme/flows@main", "path": "flow.xml"}
        });
        assert_eq!(
            GeneratorTask::from_stored(&record),
            Err(TaskError::BadField {
                generator: "diagram".to_string(),
                field: "flow_xml".to_string()
            })
        );
    }

    #[test]
    fn rejects_unknown_tags_and_non_objects() {
        assert_eq!(GeneratorTask::from_stored(&json!([])), Err(TaskError::NotAnObject));
        assert_eq!(GeneratorTask::from_stored(&json!({})), Err(TaskError::MissingTag));
        assert_eq!(
            GeneratorTask::from_stored(&json!({"generator": "chat"})),
            Err(TaskError::UnknownGenerator("chat".to_string()))
        );
    }

    #[test]
    fn sample_data_defaults_record_count() {
        let record = json!({
            "generator": "sample_data",
            "source": {"repository": "r", "path": "p.raml"},
            "schema": "types: {}"
        });
        match GeneratorTask::from_stored(&record).unwrap() {
            GeneratorTask::SampleData { record_count, .. } => {
                assert_eq!(record_count, DEFAULT_RECORD_COUNT)
            }
            other => panic!("unexpected task {other:?}"),
        }
    }

    #[test]
    fn dataweave_rejects_unknown_input_format() {
        let record = json!({
            "generator": "data_weave",
            "source": {"repository": "r", "path": "p"},
            "input_format": "cobol",
            "sample_input": ""
        });
        assert!(matches!(
            GeneratorTask::from_stored(&record),
            Err(TaskError::BadFormat { .. })
        ));
    }

    #[test]
    fn parses_generator_names_loosely() {
        assert_eq!("DataWeave".parse::<GeneratorKind>(), Ok(GeneratorKind::DataWeave));
        assert_eq!("sample-data".parse::<GeneratorKind>(), Ok(GeneratorKind::SampleData));
        assert_eq!("munit".parse::<GeneratorKind>(), Ok(GeneratorKind::MUnit));
        assert!("chat".parse::<GeneratorKind>().is_err());
    }
}
