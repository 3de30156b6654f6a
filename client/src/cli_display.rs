pub struct CliDisplay;

impl CliDisplay {
    pub fn print_room_created(code: &str) {
        println!("Created room {}", code);
    }

    pub fn print_connected_message(server_addr: &str, code: &str, username: &str) {
        println!("Connected to {} in room {} as '{}'!", server_addr, code, username);
        println!("Send messages as: <event> <json>");
    }

    pub fn print_event(event: &str, payload: &str) {
        println!("[{}] {}", event, payload);
    }

    pub fn print_error(message: &str) {
        eprintln!("Error: {}", message);
    }

    pub fn print_disconnected() {
        println!("Server closed the connection.");
    }
}
