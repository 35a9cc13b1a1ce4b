//! Scripted SOCKS5 proxy for integration tests.
//!
//! Accepts a single connection, answers each protocol step from a
//! [`ProxyScript`] and records every byte the client sent.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

pub const SUCCESS_REPLY: [u8; 10] = [0x05, 0x00, 0x00, 0x01, 0, 0, 0, 0, 0, 0];

/// How the scripted proxy answers.
#[derive(Clone)]
pub struct ProxyScript {
    /// METHOD byte sent back after the greeting
    pub method: u8,
    /// STATUS byte for the username/password reply
    pub auth_status: u8,
    /// Full reply record sent after the request
    pub reply: Vec<u8>,
    /// Bytes sent through the tunnel right after the reply
    pub payload: Vec<u8>,
    /// Stop after reading the greeting and send nothing back
    pub silent: bool,
}

impl ProxyScript {
    pub fn no_auth() -> Self {
        Self {
            method: 0x00,
            auth_status: 0x00,
            reply: SUCCESS_REPLY.to_vec(),
            payload: Vec::new(),
            silent: false,
        }
    }

    pub fn password(auth_status: u8) -> Self {
        Self {
            method: 0x02,
            auth_status,
            ..Self::no_auth()
        }
    }
}

/// Everything the client sent, split by protocol step.
#[derive(Debug, Default)]
pub struct Received {
    pub greeting: Vec<u8>,
    pub credentials: Option<Vec<u8>>,
    pub request: Option<Vec<u8>>,
    /// Bytes after the last protocol step, until the client closed
    pub trailing: Vec<u8>,
}

pub fn spawn_proxy(script: ProxyScript) -> (SocketAddr, JoinHandle<Received>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        serve(stream, &script)
    });
    (addr, handle)
}

fn serve(mut stream: TcpStream, script: &ProxyScript) -> Received {
    let mut received = Received::default();

    let mut greeting = [0u8; 3];
    stream.read_exact(&mut greeting).unwrap();
    received.greeting = greeting.to_vec();

    if script.silent {
        drain(&mut stream, &mut received);
        return received;
    }

    stream.write_all(&[0x05, script.method]).unwrap();
    if script.method != greeting[2] {
        drain(&mut stream, &mut received);
        return received;
    }

    if script.method == 0x02 {
        let mut head = [0u8; 2];
        stream.read_exact(&mut head).unwrap();
        let mut creds = head.to_vec();
        creds.extend(read_n(&mut stream, head[1] as usize));
        let plen = read_n(&mut stream, 1);
        creds.extend(&plen);
        creds.extend(read_n(&mut stream, plen[0] as usize));
        received.credentials = Some(creds);

        stream.write_all(&[0x01, script.auth_status]).unwrap();
        if script.auth_status != 0x00 {
            drain(&mut stream, &mut received);
            return received;
        }
    }

    let mut request = read_n(&mut stream, 4);
    let addr_len = match request[3] {
        0x01 => 4,
        0x04 => 16,
        _ => {
            let len = read_n(&mut stream, 1);
            request.extend(&len);
            len[0] as usize
        }
    };
    request.extend(read_n(&mut stream, addr_len + 2));
    received.request = Some(request);

    stream.write_all(&script.reply).unwrap();
    stream.write_all(&script.payload).unwrap();
    // EOF after the payload; short replies surface as a closed stream
    let _ = stream.shutdown(Shutdown::Write);
    drain(&mut stream, &mut received);
    received
}

fn read_n(stream: &mut TcpStream, n: usize) -> Vec<u8> {
    let mut buf = vec![0u8; n];
    stream.read_exact(&mut buf).unwrap();
    buf
}

fn drain(stream: &mut TcpStream, received: &mut Received) {
    // The client may reset instead of closing cleanly
    let _ = stream.read_to_end(&mut received.trailing);
}
