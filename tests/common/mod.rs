#![allow(dead_code)]

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use hazard_router::sdk::geo::Coordinate;

#[derive(Clone)]
pub struct StubResponse {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl StubResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Minimal HTTP/1.1 server standing in for OSRM. Answers requests with the
/// scripted responses in order; the last one repeats.
pub struct StubServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    pub fn start(responses: Vec<StubResponse>) -> Self {
        assert!(!responses.is_empty());
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        thread::spawn(move || {
            for (index, stream) in listener.incoming().enumerate() {
                let Ok(stream) = stream else { continue };
                let response = responses[index.min(responses.len() - 1)].clone();
                let seen = Arc::clone(&seen);
                thread::spawn(move || serve(stream, response, seen));
            }
        });

        Self {
            base_url: format!("http://{}/route/v1/driving", addr),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn serve(stream: TcpStream, response: StubResponse, seen: Arc<Mutex<Vec<String>>>) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    loop {
        let mut header = String::new();
        match reader.read_line(&mut header) {
            Ok(0) => break,
            Ok(_) if header == "\r\n" => break,
            Ok(_) => {}
            Err(_) => return,
        }
    }
    let path = request_line.split_whitespace().nth(1).unwrap_or_default().to_string();
    seen.lock().unwrap().push(path);

    thread::sleep(response.delay);
    let reply = format!(
        "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        response.status,
        response.body.len(),
        response.body
    );
    let mut stream = stream;
    let _ = stream.write_all(reply.as_bytes());
    let _ = stream.flush();
}

/// A port nothing listens on.
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/route/v1/driving", addr)
}

/// OSRM-style body whose geometry walks from `origin` to `destination` in `points` steps.
pub fn osrm_route_body(origin: Coordinate, destination: Coordinate, points: usize, meters: f64, seconds: f64) -> String {
    let coordinates: Vec<[f64; 2]> = (0..points)
        .map(|i| {
            if i == points - 1 {
                return [destination.lon, destination.lat];
            }
            let t = i as f64 / (points - 1) as f64;
            [
                origin.lon + (destination.lon - origin.lon) * t,
                origin.lat + (destination.lat - origin.lat) * t,
            ]
        })
        .collect();

    serde_json::json!({
        "code": "Ok",
        "routes": [{
            "geometry": { "type": "LineString", "coordinates": coordinates },
            "distance": meters,
            "duration": seconds,
            "legs": [{ "steps": [
                { "name": "Mathura Road", "distance": meters, "duration": seconds,
                  "maneuver": { "type": "depart" } },
                { "name": "", "distance": 0.0, "duration": 0.0,
                  "maneuver": { "type": "arrive" } }
            ]}]
        }],
        "waypoints": []
    })
    .to_string()
}
