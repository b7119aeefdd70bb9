mod fixtures;
mod test_scenarios;
mod test_transport;
