use std::sync::LazyLock;

use crate::logger::Logger;
use crate::tracking::constants::TRACKING_LOGGER_NAME;

pub static LOGGER: LazyLock<Logger> = LazyLock::new(|| Logger::new(TRACKING_LOGGER_NAME));
