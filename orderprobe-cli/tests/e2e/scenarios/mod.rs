mod cancellation;
mod fail_fast;
mod pipeline_flow;
