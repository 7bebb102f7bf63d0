// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::time::SystemTime;

#[cfg(test)]
use std::sync::Arc;
#[cfg(test)]
use std::sync::Mutex;

use jiff::Timestamp;

/// The source of "now" for record timestamps and rotated file names.
#[derive(Debug, Clone, Default)]
pub(crate) enum Clock {
    #[default]
    System,
    // shared, so a test can move time while a writer holds a copy
    #[cfg(test)]
    Manual(Arc<Mutex<Timestamp>>),
}

impl Clock {
    #[cfg(test)]
    pub(crate) fn manual(start: Timestamp) -> Clock {
        Clock::Manual(Arc::new(Mutex::new(start)))
    }

    pub(crate) fn now(&self) -> Timestamp {
        match self {
            Clock::System => Timestamp::now(),
            #[cfg(test)]
            Clock::Manual(now) => *now.lock().unwrap(),
        }
    }

    pub(crate) fn system_time(&self) -> SystemTime {
        match self {
            Clock::System => SystemTime::now(),
            #[cfg(test)]
            Clock::Manual(now) => SystemTime::from(*now.lock().unwrap()),
        }
    }

    #[cfg(test)]
    pub(crate) fn set(&self, now: Timestamp) {
        if let Clock::Manual(current) = self {
            *current.lock().unwrap() = now;
        }
    }
}
