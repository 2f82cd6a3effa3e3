// Copyright 2026 Duolu Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: Duolu Developers

mod state_goaway;
mod state_handshake;
mod state_settings;

pub use state_goaway::StateGoAway;
pub use state_handshake::StateHandshake;
pub use state_settings::StateSettings;
