mod dashboard_workflow;
mod source_http;
