//! VirtualWorld implementation of the Typst World trait
//!
//! The world holds exactly one source file (`/main.typ`). Documents get
//! their data through `sys.inputs` rather than through generated markup,
//! so arbitrary user text never has to be escaped into Typst syntax.

use chrono::{Datelike, Timelike, Utc};
use typst::diag::{FileError, FileResult};
use typst::foundations::{Array, Bytes, Datetime, Dict, Value};
use typst::syntax::{FileId, Source, VirtualPath};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, World};

use super::fonts::FontCache;
use crate::compiler::errors::EngineError;

/// A virtual world for in-memory Typst compilation
pub struct VirtualWorld {
    /// The main source file
    source: Source,
    /// Fonts available to the document
    fonts: FontCache,
    /// Pre-hashed font book built from `fonts`
    book: LazyHash<FontBook>,
    /// Fixed timestamp so `datetime.today()` is stable within a run
    time: chrono::DateTime<Utc>,
    /// Pre-hashed standard library with `sys.inputs` configured
    library: LazyHash<Library>,
}

impl VirtualWorld {
    /// Create a new VirtualWorld with the given source, inputs and fonts
    pub fn new(
        source: String,
        inputs: serde_json::Map<String, serde_json::Value>,
        fonts: FontCache,
        time: chrono::DateTime<Utc>,
    ) -> Result<Self, EngineError> {
        let id = FileId::new(None, VirtualPath::new("/main.typ"));
        let inputs_dict = Self::convert_inputs(inputs)?;
        let library = Library::builder().with_inputs(inputs_dict).build();
        let book = LazyHash::new(fonts.book().clone());

        Ok(Self {
            source: Source::new(id, source),
            fonts,
            book,
            time,
            library: LazyHash::new(library),
        })
    }

    /// Convert JSON inputs to a Typst Dict
    fn convert_inputs(
        inputs: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Dict, EngineError> {
        let mut dict = Dict::new();

        for (key, value) in inputs {
            let typst_value = Self::json_to_typst_value(&value)?;
            dict.insert(key.as_str().into(), typst_value);
        }

        Ok(dict)
    }

    /// Convert a JSON value to a Typst Value
    fn json_to_typst_value(json: &serde_json::Value) -> Result<Value, EngineError> {
        match json {
            serde_json::Value::Null => Ok(Value::None),
            serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::Float(f))
                } else {
                    Err(EngineError::InvalidInput(format!("Invalid number: {}", n)))
                }
            }
            serde_json::Value::String(s) => Ok(Value::Str(s.as_str().into())),
            serde_json::Value::Array(arr) => {
                let items: Vec<Value> = arr
                    .iter()
                    .map(Self::json_to_typst_value)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Array(Array::from(items.as_slice())))
            }
            serde_json::Value::Object(obj) => {
                let mut dict = Dict::new();
                for (k, v) in obj {
                    dict.insert(k.as_str().into(), Self::json_to_typst_value(v)?);
                }
                Ok(Value::Dict(dict))
            }
        }
    }

    /// Get the main source
    pub fn main_source(&self) -> &Source {
        &self.source
    }
}

impl World for VirtualWorld {
    fn library(&self) -> &LazyHash<Library> {
        &self.library
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &self.book
    }

    fn main(&self) -> FileId {
        self.source.id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.source.id() {
            Ok(self.source.clone())
        } else {
            Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
        }
    }

    // Documents are self-contained; there are no binary assets to serve.
    fn file(&self, id: FileId) -> FileResult<Bytes> {
        Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
    }

    fn font(&self, index: usize) -> Option<Font> {
        self.fonts.font(index)
    }

    fn today(&self, offset: Option<i64>) -> Option<Datetime> {
        let offset_hours = offset.unwrap_or(0);
        let adjusted = self.time + chrono::Duration::hours(offset_hours);

        Datetime::from_ymd_hms(
            adjusted.year(),
            adjusted.month() as u8,
            adjusted.day() as u8,
            adjusted.hour() as u8,
            adjusted.minute() as u8,
            adjusted.second() as u8,
        )
    }
}
