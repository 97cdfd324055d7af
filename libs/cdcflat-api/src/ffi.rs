use crate::config::{ConfigParam, ConfigValues};

/// Current ABI version. Host checks this against the plugin's `cf_abi_version()`.
pub const CF_ABI_VERSION: u32 = 1;

/// FFI return struct from `cf_create_transform`.
///
/// Host and plugin are built by the same compiler from one workspace, so the
/// Rust trait-object layout behind `plugin_ptr` matches on both sides.
#[repr(C)]
pub struct PluginCreateResult {
    /// `Box<Box<dyn RecordTransform>>` on success, null on failure.
    pub plugin_ptr: *mut (),
    /// Heap-allocated UTF-8 error message on failure, null on success.
    pub error_ptr: *mut u8,
    pub error_len: usize,
}

pub type AbiVersionFn = unsafe extern "C" fn() -> u32;

/// Returns a pointer to a boxed `Vec<ConfigParam>`. Caller takes ownership.
pub type ConfigParamsFn = unsafe extern "C" fn() -> *mut ();

/// Takes a pointer to host-owned `ConfigValues` (plugin borrows, does not own).
pub type CreatePluginFn = unsafe extern "C" fn(*const ()) -> PluginCreateResult;

pub type DestroyPluginFn = unsafe extern "C" fn(*mut ());

pub fn plugin_ok<T: ?Sized>(plugin: Box<Box<T>>) -> PluginCreateResult {
    PluginCreateResult {
        plugin_ptr: Box::into_raw(plugin) as *mut (),
        error_ptr: std::ptr::null_mut(),
        error_len: 0,
    }
}

pub fn plugin_err(msg: &str) -> PluginCreateResult {
    let bytes = msg.as_bytes().to_vec().into_boxed_slice();
    let len = bytes.len();
    PluginCreateResult {
        plugin_ptr: std::ptr::null_mut(),
        error_ptr: Box::into_raw(bytes) as *mut u8,
        error_len: len,
    }
}

pub fn config_params_ok(params: Vec<ConfigParam>) -> *mut () {
    Box::into_raw(Box::new(params)) as *mut ()
}

/// # Safety
///
/// `ptr` must point to a live `ConfigValues` owned by the host for `'a`.
pub unsafe fn config_from_ptr<'a>(ptr: *const ()) -> &'a ConfigValues {
    unsafe { &*(ptr as *const ConfigValues) }
}

#[macro_export]
macro_rules! cf_abi_version_fn {
    () => {
        #[unsafe(no_mangle)]
        pub extern "C" fn cf_abi_version() -> u32 {
            $crate::ffi::CF_ABI_VERSION
        }
    };
}

/// Export `cf_config_params` from a `#[derive(ConfigParams)]` type.
#[macro_export]
macro_rules! cf_config_params_fn {
    ($config_type:ty) => {
        #[unsafe(no_mangle)]
        pub extern "C" fn cf_config_params() -> *mut () {
            $crate::ffi::config_params_ok(<$config_type>::config_params())
        }
    };
}

#[macro_export]
macro_rules! cf_destroy_fn {
    ($name:ident, $trait_ty:path) => {
        /// # Safety
        ///
        /// `ptr` must come from the matching create function and be destroyed once.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name(ptr: *mut ()) {
            if !ptr.is_null() {
                let _ = unsafe { Box::from_raw(ptr as *mut Box<dyn $trait_ty>) };
            }
        }
    };
}

/// Export `cf_create_transform` for a type with a fallible
/// `from_config(&ConfigValues)` constructor.
#[macro_export]
macro_rules! cf_create_transform_fn {
    ($transform:ty) => {
        /// # Safety
        ///
        /// `config_ptr` must point to a live `ConfigValues` owned by the host.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn cf_create_transform(
            config_ptr: *const (),
        ) -> $crate::ffi::PluginCreateResult {
            let config = unsafe { $crate::ffi::config_from_ptr(config_ptr) };
            match <$transform>::from_config(config) {
                Ok(t) => $crate::ffi::plugin_ok(Box::new(
                    Box::new(t) as Box<dyn $crate::transform::RecordTransform>,
                )),
                Err(e) => $crate::ffi::plugin_err(&e.to_string()),
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugin_err_carries_message() {
        let result = plugin_err("bad config");
        assert!(result.plugin_ptr.is_null());
        let msg = unsafe {
            Box::from_raw(core::ptr::slice_from_raw_parts_mut(
                result.error_ptr,
                result.error_len,
            ))
        };
        assert_eq!(&*msg, b"bad config");
    }

    #[test]
    fn config_params_round_trip_through_raw_pointer() {
        let ptr = config_params_ok(vec![ConfigParam {
            name: "log_rejected".into(),
            param_type: crate::config::ParamType::Bool,
            required: false,
            default: None,
            description: "log drops".into(),
        }]);
        let params = unsafe { *Box::from_raw(ptr as *mut Vec<ConfigParam>) };
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name, "log_rejected");
    }
}
