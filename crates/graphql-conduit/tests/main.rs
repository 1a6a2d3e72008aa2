mod hooks;
mod http_adapter;
mod introspection;
mod pipeline;
