// Copyright 2026 Duolu Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: Duolu Developers

use std::{env, error::Error};

use async_trait::async_trait;
use duolu::{
    http2::hpack::HeaderField, Builder, PlainHandshaker, ProtResult, Server, StreamHandler,
    StreamIdentifier, StreamMessage,
};

struct Echo;

#[async_trait]
impl StreamHandler for Echo {
    async fn handle(
        &self,
        stream_id: StreamIdentifier,
        message: StreamMessage,
    ) -> ProtResult<StreamMessage> {
        println!("stream {} recv {} bytes", stream_id, message.body.len());
        let mut headers = vec![HeaderField::new(":status", "200")];
        if let Some(path) = message.header(":path") {
            headers.push(HeaderField::new("x-echo-path", path.clone()));
        }
        Ok(StreamMessage::new(headers, message.body))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let addr = env::args()
        .nth(1)
        .unwrap_or_else(|| "0.0.0.0:8080".to_string());
    let builder = match env::args().nth(2) {
        Some(path) => Builder::from_toml(&std::fs::read_to_string(path)?)?,
        None => Builder::new(),
    };
    let server = Server::bind(&addr, PlainHandshaker, Echo, builder).await?;
    println!("Listening on: {}", server.local_addr()?);
    server.run().await?;
    Ok(())
}
