use std::collections::{HashMap, HashSet};
use std::path::Path;

use libloading::{Library, Symbol};

use cdcflat_api::config::{ConfigParam, ConfigValues, ParamType, ParamValue};
use cdcflat_api::ffi::{
    AbiVersionFn, ConfigParamsFn, CreatePluginFn, DestroyPluginFn, PluginCreateResult,
    CF_ABI_VERSION,
};
use cdcflat_api::transform::RecordTransform;

use crate::error::HostError;

/// A loaded .so plugin library with ABI version already verified.
pub struct PluginLib {
    lib: Library,
    config_params_fn: ConfigParamsFn,
    create_fn: CreatePluginFn,
    destroy_fn: DestroyPluginFn,
}

impl PluginLib {
    /// Load a transform plugin from `path`, verify ABI version, resolve symbols.
    pub fn load(path: &Path) -> Result<Self, HostError> {
        let lib = unsafe { Library::new(path) }.map_err(|e| {
            HostError::Config(format!("failed to load plugin '{}': {e}", path.display()))
        })?;

        let abi_fn = *resolve::<AbiVersionFn>(&lib, path, b"cf_abi_version")?;
        check_abi(path, unsafe { abi_fn() })?;

        let config_params_fn = *resolve::<ConfigParamsFn>(&lib, path, b"cf_config_params")?;
        let create_fn = *resolve::<CreatePluginFn>(&lib, path, b"cf_create_transform")?;
        let destroy_fn = *resolve::<DestroyPluginFn>(&lib, path, b"cf_destroy_transform")?;

        Ok(Self {
            lib,
            config_params_fn,
            create_fn,
            destroy_fn,
        })
    }

    /// Plugin's declared config parameters.
    pub fn config_params(&self) -> Vec<ConfigParam> {
        let ptr = unsafe { (self.config_params_fn)() };
        if ptr.is_null() {
            return Vec::new();
        }
        unsafe { *Box::from_raw(ptr as *mut Vec<ConfigParam>) }
    }

    /// Create the transform with validated values. The library stays loaded
    /// for as long as the returned wrapper lives.
    pub fn create(self, config: &ConfigValues) -> Result<PluginTransform, HostError> {
        let result: PluginCreateResult =
            unsafe { (self.create_fn)(config as *const ConfigValues as *const ()) };

        if result.plugin_ptr.is_null() {
            let msg = if !result.error_ptr.is_null() && result.error_len > 0 {
                // Reclaim the message allocated by the plugin.
                let bytes = unsafe {
                    Box::from_raw(core::ptr::slice_from_raw_parts_mut(
                        result.error_ptr,
                        result.error_len,
                    ))
                };
                String::from_utf8_lossy(&bytes).into_owned()
            } else {
                "unknown error".to_string()
            };
            return Err(HostError::Config(format!("plugin create failed: {msg}")));
        }

        let inner = unsafe { *Box::from_raw(result.plugin_ptr as *mut Box<dyn RecordTransform>) };
        Ok(PluginTransform {
            inner: Some(inner),
            destroy_fn: self.destroy_fn,
            _lib: self.lib,
        })
    }
}

/// Refuse plugins built against a different `CF_ABI_VERSION`.
pub fn check_abi(path: &Path, plugin_abi: u32) -> Result<(), HostError> {
    if plugin_abi != CF_ABI_VERSION {
        return Err(HostError::Config(format!(
            "plugin '{}' ABI version mismatch: plugin={plugin_abi}, host={CF_ABI_VERSION}",
            path.display()
        )));
    }
    Ok(())
}

fn resolve<'lib, T>(
    lib: &'lib Library,
    path: &Path,
    symbol: &[u8],
) -> Result<Symbol<'lib, T>, HostError> {
    unsafe { lib.get::<T>(symbol) }.map_err(|e| {
        HostError::Config(format!(
            "plugin '{}' missing {} symbol: {e}",
            path.display(),
            String::from_utf8_lossy(symbol)
        ))
    })
}

/// Transform living in a dynamically loaded library.
pub struct PluginTransform {
    inner: Option<Box<dyn RecordTransform>>,
    destroy_fn: DestroyPluginFn,
    _lib: Library,
}

impl RecordTransform for PluginTransform {
    fn name(&self) -> &'static str {
        self.inner.as_ref().map_or("unloaded", |t| t.name())
    }

    fn transform(&self, raw: &str) -> String {
        match &self.inner {
            Some(t) => t.transform(raw),
            None => cdcflat_api::transform::DROP_SENTINEL.to_string(),
        }
    }
}

impl Drop for PluginTransform {
    fn drop(&mut self) {
        // Hand the object back to the plugin while its code is still mapped.
        if let Some(inner) = self.inner.take() {
            let ptr = Box::into_raw(Box::new(inner)) as *mut ();
            unsafe { (self.destroy_fn)(ptr) };
        }
    }
}

// ---------------------------------------------------------------------------
// Config parsing & validation
// ---------------------------------------------------------------------------

/// Check the user's parameter table against the declared params.
///
/// - Rejects unknown keys.
/// - Converts each present value according to its declared `ParamType`.
///
/// Defaults and required checks are handled by `validate_and_build`.
pub fn parse_plugin_config(
    config: Option<&serde_json::Value>,
    params: &[ConfigParam],
) -> Result<HashMap<String, ParamValue>, HostError> {
    let obj = match config {
        Some(serde_json::Value::Object(map)) => map,
        Some(_) => {
            return Err(HostError::Config(
                "transform config must be a table".into(),
            ))
        }
        None => return Ok(HashMap::new()),
    };

    let known: HashSet<&str> = params.iter().map(|p| p.name.as_str()).collect();
    if let Some(key) = obj.keys().find(|k| !known.contains(k.as_str())) {
        return Err(HostError::Config(format!("unknown parameter '{key}'")));
    }

    let mut result = HashMap::new();
    for param in params {
        if let Some(v) = obj.get(&param.name) {
            result.insert(param.name.clone(), value_to_param_value(v, param)?);
        }
    }
    Ok(result)
}

/// Build `ConfigValues`: parsed value, else default, else error if required.
pub fn validate_and_build(
    parsed: &HashMap<String, ParamValue>,
    params: &[ConfigParam],
) -> Result<ConfigValues, HostError> {
    let mut values = ConfigValues::new();

    for param in params {
        match parsed.get(&param.name) {
            Some(v) => values.set(&param.name, v.clone()),
            None => {
                if let Some(ref default) = param.default {
                    values.set(&param.name, default.clone());
                } else if param.required {
                    return Err(HostError::Config(format!(
                        "missing required parameter '{}'",
                        param.name
                    )));
                }
            }
        }
    }

    Ok(values)
}

/// Parse then validate in one step.
pub fn build_config_values(
    config: Option<&serde_json::Value>,
    params: &[ConfigParam],
) -> Result<ConfigValues, HostError> {
    let parsed = parse_plugin_config(config, params)?;
    validate_and_build(&parsed, params)
}

fn value_to_param_value(
    val: &serde_json::Value,
    param: &ConfigParam,
) -> Result<ParamValue, HostError> {
    let mismatch = || {
        HostError::Config(format!(
            "parameter '{}': expected {}, got {val}",
            param.name, param.param_type
        ))
    };
    match param.param_type {
        ParamType::Bool => val.as_bool().map(ParamValue::Bool).ok_or_else(mismatch),
        ParamType::I64 => val.as_i64().map(ParamValue::I64).ok_or_else(mismatch),
        ParamType::U64 => val.as_u64().map(ParamValue::U64).ok_or_else(mismatch),
        ParamType::Str => val
            .as_str()
            .map(|s| ParamValue::Str(s.to_string()))
            .ok_or_else(mismatch),
    }
}

/// Load a transform plugin from a .so file.
///
/// 1. Load .so, verify ABI version.
/// 2. Read declared params via `cf_config_params()`.
/// 3. Validate `config` against them.
/// 4. Call `cf_create_transform(&config_values)`.
pub fn load_transform(
    path: &Path,
    config: Option<&serde_json::Value>,
) -> Result<PluginTransform, HostError> {
    let lib = PluginLib::load(path)?;
    let params = lib.config_params();
    let values = build_config_values(config, &params)
        .map_err(|e| e.with_context(path.display()))?;
    let transform = lib.create(&values)?;
    tracing::info!(
        plugin = %path.display(),
        transform = transform.name(),
        params = values.len(),
        "loaded transform plugin"
    );
    Ok(transform)
}
