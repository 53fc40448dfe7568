//! JSON-RPC through the injected `window.ethereum` provider (EIP-1193).

#![allow(deprecated)]

use coffee::CoffeeError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = window, js_name = ethereum)]
    static ETHEREUM: JsValue;

    #[wasm_bindgen(catch, js_namespace = ["window", "ethereum"], js_name = request)]
    async fn ethereum_request(args: &JsValue) -> Result<JsValue, JsValue>;
}

/// Whether a wallet extension injected `window.ethereum`.
pub fn has_provider() -> bool {
    !(ETHEREUM.is_undefined() || ETHEREUM.is_null())
}

/// Send `{ method, params }` to the wallet and return the raw JSON result
/// (`Value::Null` for `null`/`undefined`).
pub async fn request(method: &str, params: Value) -> Result<Value, CoffeeError> {
    if !has_provider() {
        return Err(CoffeeError::NoWallet);
    }

    let args = serde_json::json!({ "method": method, "params": params });
    let args = js_sys::JSON::parse(&serde_json::to_string(&args)?)
        .map_err(|e| CoffeeError::Wallet(format!("failed to build {method} request: {e:?}")))?;

    let result = ethereum_request(&args)
        .await
        .map_err(|e| CoffeeError::Wallet(format!("{method} failed: {}", js_error_message(&e))))?;

    if result.is_undefined() || result.is_null() {
        return Ok(Value::Null);
    }

    let text: String = js_sys::JSON::stringify(&result)
        .map_err(|e| CoffeeError::Wallet(format!("{method} returned unserializable value: {e:?}")))?
        .into();
    Ok(serde_json::from_str(&text)?)
}

/// [`request`] and deserialize the result.
pub async fn request_as<T: DeserializeOwned>(method: &str, params: Value) -> Result<T, CoffeeError> {
    Ok(serde_json::from_value(request(method, params).await?)?)
}

/// Wallets reject with `{ code, message }` objects; fall back to debug output.
fn js_error_message(err: &JsValue) -> String {
    js_sys::Reflect::get(err, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| format!("{err:?}"))
}

/// Encode a JSON-RPC quantity.
pub fn quantity(n: u64) -> String {
    format!("0x{n:x}")
}

/// Decode a JSON-RPC quantity such as `"0x1b4"`.
pub fn parse_quantity(s: &str) -> Result<u64, CoffeeError> {
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| CoffeeError::Decode(format!("quantity {s:?} lacks 0x prefix")))?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| CoffeeError::Decode(format!("bad quantity {s:?}: {e}")))
}
