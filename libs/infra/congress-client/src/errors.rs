// [libs/infra/congress-client/src/errors.rs]
/*!
 * APARATO: CONGRESS CLIENT ERROR CATALOG (ESTRATO L3)
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("CONFIG_FAULT: CONGRESS_API_KEY is not set")]
    MissingApiKey,

    #[error("NETWORK_FAULT: transport error talking to congress.gov: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("DECODE_FAULT: failed to decode JSON body for {label}: {source}")]
    Decode {
        label: String,
        #[source]
        source: serde_json::Error,
    },
}
