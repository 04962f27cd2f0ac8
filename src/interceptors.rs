use std::time::Instant;

use aws_sdk_s3::config::interceptors::{
    BeforeTransmitInterceptorContextRef, FinalizerInterceptorContextRef,
};
use aws_smithy_runtime_api::box_error::BoxError;
use aws_smithy_runtime_api::client::interceptors::Intercept;
use aws_smithy_runtime_api::client::runtime_components::RuntimeComponents;
use aws_smithy_types::config_bag::{ConfigBag, Storable, StoreReplace};
use tracing::debug;

/// Logs every S3 attempt at `debug`: method, URI, status, body size and wire time.
/// Retries show up as separate attempts.
#[derive(Debug)]
pub(crate) struct RequestTimingInterceptor;

#[derive(Debug)]
struct AttemptStarted(Instant);

impl Storable for AttemptStarted {
    type Storer = StoreReplace<Self>;
}

impl Intercept for RequestTimingInterceptor {
    fn name(&self) -> &'static str {
        "RequestTimingInterceptor"
    }

    fn read_before_transmit(
        &self,
        context: &BeforeTransmitInterceptorContextRef<'_>,
        _runtime_components: &RuntimeComponents,
        cfg: &mut ConfigBag,
    ) -> Result<(), BoxError> {
        let request = context.request();
        debug!(method = request.method(), uri = request.uri(), "s3 attempt");
        cfg.interceptor_state()
            .store_put(AttemptStarted(Instant::now()));
        Ok(())
    }

    fn read_after_attempt(
        &self,
        context: &FinalizerInterceptorContextRef<'_>,
        _runtime_components: &RuntimeComponents,
        cfg: &mut ConfigBag,
    ) -> Result<(), BoxError> {
        let wire_time = cfg
            .load::<AttemptStarted>()
            .map(|started| started.0.elapsed());
        match context.response() {
            Some(response) => debug!(
                status = response.status().as_u16(),
                bytes = response.body().content_length().unwrap_or(0),
                wire_time = ?wire_time,
                "s3 attempt finished"
            ),
            None => debug!(wire_time = ?wire_time, "s3 attempt got no response"),
        }
        Ok(())
    }
}
