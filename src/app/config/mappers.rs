use super::groups::FieldBinding;
use super::{Config, ConfigError, TimestampSource};
use crate::domain::DEFAULT_APPLICATION_NAME;
use crate::mapper::{
    Generator, LogBatchMapper, LogField, LogMapper, Mapper, StringMapper, TagsMapper,
};
use tracing::warn;

const DEFAULT_TAG: &str = "default";
const DEFAULT_LEVEL: &str = "INFO";
const DEFAULT_MESSAGE_KEY: &str = "message";

fn bind(
    binding: Option<&FieldBinding>,
    field: LogField,
    default: impl FnOnce() -> Mapper,
) -> Result<StringMapper, ConfigError> {
    let mapper = match binding {
        Some(binding) => binding.to_mapper(field)?,
        None => default(),
    };
    Ok(StringMapper::new(mapper))
}

fn host_name() -> String {
    match hostname::get() {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(e) => {
            warn!("Could not read host name ({e}); using {DEFAULT_APPLICATION_NAME}");
            DEFAULT_APPLICATION_NAME.to_string()
        }
    }
}

impl Config {
    /// Binds every output field to its mapper, falling back to the defaults
    /// for fields without a binding.
    pub fn log_batch_mapper(&self) -> Result<LogBatchMapper, ConfigError> {
        let fields = &self.fields;

        let timestamp_default = match self.timestamp_source {
            TimestampSource::Generated => Mapper::Generator(Generator::Iso8601Now),
            TimestampSource::Event => Mapper::EventTime,
        };

        Ok(LogBatchMapper {
            application_name: bind(fields.application.as_ref(), LogField::ApplicationName, || {
                Mapper::constant(host_name())
            })?,
            tag: bind(fields.tag.as_ref(), LogField::Tag, || {
                Mapper::constant(DEFAULT_TAG)
            })?,
            log: LogMapper {
                timestamp: bind(fields.timestamp.as_ref(), LogField::Timestamp, || {
                    timestamp_default
                })?,
                message: bind(fields.message.as_ref(), LogField::Message, || {
                    Mapper::key(DEFAULT_MESSAGE_KEY)
                })?,
                level: bind(fields.level.as_ref(), LogField::Level, || {
                    Mapper::constant(DEFAULT_LEVEL)
                })?,
                tags: TagsMapper::new(fields.tags.clone()),
            },
        })
    }
}
