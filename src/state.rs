// state.rs

use crate::*;

pub struct MyState {
    pub config: MyConfig,
    pub querier: Arc<dyn GeoQuerier>,
    pub actuator: Arc<dyn Actuator>,
    pub api_cnt: AtomicU64,
}

impl MyState {
    pub fn new(config: MyConfig, querier: Arc<dyn GeoQuerier>, actuator: Arc<dyn Actuator>) -> Self {
        MyState {
            config,
            querier,
            actuator,
            api_cnt: AtomicU64::new(0),
        }
    }
}

// EOF
