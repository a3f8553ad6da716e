/// This example demonstrates sending a structured value as a JSON body and
/// reading the decoded response back into a struct.

use onereq::{Method, RequestOptions, Transport};

#[derive(serde::Serialize)]
struct Payload {
    message: String,
}

#[derive(serde::Deserialize)]
struct Reply {
    json: serde_json::Value,
}

fn main() -> Result<(), onereq::Error> {
    let payload = Payload {
        message: "Hello, world!".to_string(),
    };
    let response = RequestOptions::new(Transport::Http, "httpbin.org", "/anything")
        .with_method(Method::Post)
        .with_json(&payload)?
        .send()?;
    // httpbin echoes the parsed request body under the "json" key.
    let reply: Reply = response.json()?;
    println!("{}", reply.json);
    Ok(())
}
