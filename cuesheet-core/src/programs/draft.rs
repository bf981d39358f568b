use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::{
    validation::{coerce_order_index, serial_text},
    Field, FieldClearing, NewProgram, ProgramChanges, ProgramType, ValidationError,
};

/// Program fields as a client submits them, for creation or as a partial
/// update. Absent fields are `None`. A field sent as `null` is present but
/// empty: text fields read as `""` and the rest keep the `null`.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramDraft {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub program_type: Option<String>,
    /// An integer, or a string holding one
    #[serde(default, deserialize_with = "keep_null")]
    pub order_index: Option<Value>,
    /// A string or a number
    #[serde(default, deserialize_with = "keep_null")]
    pub serial: Option<Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub day: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub shift: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub broadcast_time: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub program_details: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub period: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub artist: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub lyricist: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub composer: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub cd_cut: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub duration: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source: Option<String>,
    /// Keys that aren't program fields. They are never stored.
    #[serde(flatten)]
    pub unknown: Map<String, Value>,
}

/// Keys clients echo back from a fetched program
const ECHOED_KEYS: [&str; 2] = ["_id", "type"];

fn null_as_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Some(Option::<String>::deserialize(deserializer)?.unwrap_or_default()))
}

fn keep_null<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

impl ProgramDraft {
    pub fn program_type(&self) -> ProgramType {
        ProgramType::from(self.program_type.as_deref().unwrap_or_default())
    }

    /// Whether the field carries a usable value. Empty strings don't count.
    pub fn has(&self, field: Field) -> bool {
        match field {
            Field::ProgramType => filled(&self.program_type),
            Field::OrderIndex => self.order_index.as_ref().is_some_and(|v| !v.is_null()),
            Field::Serial => match &self.serial {
                Some(Value::String(s)) => !s.is_empty(),
                Some(Value::Null) | None => false,
                Some(_) => true,
            },
            Field::BroadcastTime => filled(&self.broadcast_time),
            Field::ProgramDetails => filled(&self.program_details),
            Field::Day => filled(&self.day),
            Field::Shift => filled(&self.shift),
            Field::Period => filled(&self.period),
            Field::Artist => filled(&self.artist),
        }
    }

    /// True if the draft names nothing but `serial` and `orderIndex`,
    /// which is what a drag-and-drop reorder sends. Unknown keys count,
    /// except the echoed `_id` and `type`.
    pub fn touches_only_order(&self) -> bool {
        let Self {
            program_type,
            order_index: _,
            serial: _,
            day,
            shift,
            broadcast_time,
            program_details,
            period,
            artist,
            lyricist,
            composer,
            cd_cut,
            duration,
            source,
            unknown,
        } = self;

        let named = [
            program_type,
            day,
            shift,
            broadcast_time,
            program_details,
            period,
            artist,
            lyricist,
            composer,
            cd_cut,
            duration,
            source,
        ];

        named.iter().all(|field| field.is_none())
            && unknown.keys().all(|key| ECHOED_KEYS.contains(&key.as_str()))
    }

    /// Builds the stored form. Songs get their scheduling fields cleared,
    /// everything else gets the song-only fields cleared.
    pub(crate) fn into_new_program(self) -> Result<NewProgram, ValidationError> {
        let is_song = self.program_type().is_song();

        let order_index = self
            .order_index
            .as_ref()
            .map(coerce_order_index)
            .transpose()?
            .unwrap_or_default();

        let serial = match self.serial {
            Some(serial) if !is_song => serial_text(serial)?,
            _ => String::new(),
        };

        let unless_song = |value: Option<String>| {
            if is_song {
                String::new()
            } else {
                value.unwrap_or_default()
            }
        };

        let song_only = |value: Option<String>| {
            if is_song {
                value.unwrap_or_default()
            } else {
                String::new()
            }
        };

        Ok(NewProgram {
            program_type: self.program_type.unwrap_or_default(),
            day: unless_song(self.day),
            shift: unless_song(self.shift),
            order_index,
            serial,
            broadcast_time: unless_song(self.broadcast_time),
            program_details: self.program_details.unwrap_or_default(),
            period: unless_song(self.period),
            artist: song_only(self.artist),
            lyricist: song_only(self.lyricist),
            composer: song_only(self.composer),
            cd_cut: song_only(self.cd_cut),
            duration: song_only(self.duration),
            source: self.source,
            owner_id: None,
        })
    }

    /// Builds the set of fields to replace, normalizing `serial` and
    /// coercing `orderIndex` on the way.
    pub(crate) fn into_changes(self) -> Result<ProgramChanges, ValidationError> {
        Ok(ProgramChanges {
            order_index: self
                .order_index
                .as_ref()
                .map(coerce_order_index)
                .transpose()?,
            serial: self.serial.map(serial_text).transpose()?,
            program_type: self.program_type,
            day: self.day,
            shift: self.shift,
            broadcast_time: self.broadcast_time,
            program_details: self.program_details,
            period: self.period,
            artist: self.artist,
            lyricist: self.lyricist,
            composer: self.composer,
            cd_cut: self.cd_cut,
            duration: self.duration,
            source: self.source,
            clearing: FieldClearing::Keep,
        })
    }
}

impl ProgramChanges {
    /// Empties the fields a song never carries
    pub fn clear_scheduling(&mut self) {
        for field in [
            &mut self.serial,
            &mut self.broadcast_time,
            &mut self.period,
            &mut self.day,
            &mut self.shift,
        ] {
            *field = Some(String::new());
        }
    }

    /// Replaces absent song-only fields with empty strings
    pub fn clear_song_fields(&mut self) {
        for field in [
            &mut self.artist,
            &mut self.lyricist,
            &mut self.composer,
            &mut self.cd_cut,
            &mut self.duration,
        ] {
            field.get_or_insert_with(String::new);
        }
    }
}
