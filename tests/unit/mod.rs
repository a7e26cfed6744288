mod filter_scenarios;
mod pipeline_properties;
