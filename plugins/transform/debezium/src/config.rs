use cdcflat_api::ConfigParams;

/// Parameters of the Debezium flatten transform.
#[derive(Debug, Clone, ConfigParams)]
pub struct FlattenConfig {
    #[param(description = "Log rejected change events at warn level (debug when false)")]
    pub log_rejected: bool,

    #[param(description = "Maximum number of input characters quoted in a rejection log event")]
    pub log_input_limit: u64,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        Self {
            log_rejected: true,
            log_input_limit: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdcflat_api::config::{ConfigValues, ParamType, ParamValue};

    #[test]
    fn declares_optional_params_with_defaults() {
        let params = FlattenConfig::config_params();
        assert_eq!(params.len(), 2);

        assert_eq!(params[0].name, "log_rejected");
        assert_eq!(params[0].param_type, ParamType::Bool);
        assert!(!params[0].required);
        assert_eq!(params[0].default, Some(ParamValue::Bool(true)));

        assert_eq!(params[1].name, "log_input_limit");
        assert_eq!(params[1].param_type, ParamType::U64);
        assert_eq!(params[1].default, Some(ParamValue::U64(256)));
    }

    #[test]
    fn reads_values_over_defaults() {
        let mut values = ConfigValues::new();
        values.set("log_rejected", ParamValue::Bool(false));
        values.set("log_input_limit", ParamValue::I64(32));

        let config = FlattenConfig::from_config(&values).unwrap();
        assert!(!config.log_rejected);
        assert_eq!(config.log_input_limit, 32);
    }

    #[test]
    fn empty_values_fall_back_to_defaults() {
        let config = FlattenConfig::from_config(&ConfigValues::new()).unwrap();
        assert!(config.log_rejected);
        assert_eq!(config.log_input_limit, 256);
    }

    #[derive(Debug, Default, ConfigParams)]
    struct Window {
        #[param(description = "Rows per window", required)]
        rows: usize,
        #[param(description = "Windows kept")]
        keep: usize,
    }

    #[test]
    fn usize_params_are_declared_and_read_as_u64() {
        let params = Window::config_params();
        assert_eq!(params[0].param_type, ParamType::U64);
        assert!(params[0].required);
        assert_eq!(params[1].default, Some(ParamValue::U64(0)));

        let mut values = ConfigValues::new();
        values.set("rows", ParamValue::U64(4096));
        let window = Window::from_config(&values).unwrap();
        assert_eq!(window.rows, 4096);
        assert_eq!(window.keep, 0);

        let err = Window::from_config(&ConfigValues::new()).unwrap_err();
        assert!(err.message.contains("'rows'"));
    }

    #[cfg(target_pointer_width = "32")]
    #[test]
    fn usize_param_out_of_range_is_config_error() {
        let mut values = ConfigValues::new();
        values.set("rows", ParamValue::U64(u64::MAX));
        let err = Window::from_config(&values).unwrap_err();
        assert_eq!(err.kind, cdcflat_api::error::ErrorKind::Config);
        assert!(err.message.contains("does not fit in usize"));
    }
}
