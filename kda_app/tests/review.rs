use std::thread;

use kda_app::{
    AutomatedScreen, Automation, ChannelScreen, CommandRequest, Config, Dispatcher, EventLog,
    Input, Page, Screen, Status, UiEvent,
};
use kda_signer::SwSigner;
use kda_test_util::{
    init_logging, DEFAULT_SPECULOS_MNEMONIC, FIXTURE_ADDRESS_1, FIXTURE_PATH_0, FIXTURE_PATH_1,
    FIXTURE_PUBKEY_0, FIXTURE_PUBKEY_1, TEST_MNEMONIC,
};
use serde_json::json;

fn dispatcher() -> Dispatcher<SwSigner> {
    init_logging();
    let signer = SwSigner::new(DEFAULT_SPECULOS_MNEMONIC).unwrap();
    Dispatcher::new(signer, Config::default())
}

fn expected_screens() -> serde_json::Value {
    json!([
        { "header": "Provide Public Key", "prompt": "" },
        { "header": "Address", "prompt": FIXTURE_ADDRESS_1, "paginate": true },
        { "text": "Confirm", "x": 43, "y": 11 },
    ])
}

#[test]
fn get_public_key_fixture() {
    let dispatcher = dispatcher();
    let log = EventLog::default();
    let mut screen = AutomatedScreen::new(Automation::RejectAll, log.clone());

    let response =
        dispatcher.handle(&CommandRequest::get_public_key(FIXTURE_PATH_0), &mut screen);
    assert_eq!(response.status, Status::Ok);
    assert_eq!(response.public_key().unwrap().to_hex(), FIXTURE_PUBKEY_0);
    assert!(log.is_empty());
}

#[test]
fn verify_address_accepted() {
    let dispatcher = dispatcher();
    let log = EventLog::default();
    let mut screen = AutomatedScreen::new(Automation::AcceptAll, log.clone());

    let response =
        dispatcher.handle(&CommandRequest::verify_address(FIXTURE_PATH_1), &mut screen);
    assert_eq!(response.status, Status::Ok);
    assert_eq!(response.public_key().unwrap().to_hex(), FIXTURE_PUBKEY_1);
    assert_eq!(log.to_json(), expected_screens());
}

#[test]
fn verify_address_rejected() {
    let dispatcher = dispatcher();
    let log = EventLog::default();
    let mut screen = AutomatedScreen::new(Automation::RejectAll, log.clone());

    let response =
        dispatcher.handle(&CommandRequest::verify_address(FIXTURE_PATH_1), &mut screen);
    assert_eq!(response.status, Status::UserRejected);
    assert_eq!(response.public_key(), None);
    assert_eq!(log.to_json(), expected_screens());
}

#[test]
fn reject_before_confirm_screen() {
    let dispatcher = dispatcher();
    let log = EventLog::default();
    let script = Automation::Script(vec![Input::Next, Input::Reject]);
    let mut screen = AutomatedScreen::new(script, log.clone());

    let response =
        dispatcher.handle(&CommandRequest::verify_address(FIXTURE_PATH_1), &mut screen);
    assert_eq!(response.status, Status::UserRejected);
    assert_eq!(log.len(), 2);
}

#[test]
fn accept_outside_confirm_is_ignored() {
    let dispatcher = dispatcher();
    let log = EventLog::default();
    // the address takes 5 pages of 16 characters
    let mut inputs = vec![Input::Accept, Input::Next, Input::Accept];
    inputs.extend([Input::Page; 4]);
    inputs.extend([Input::Next, Input::Accept]);
    let mut screen = AutomatedScreen::new(Automation::Script(inputs), log.clone());

    let response =
        dispatcher.handle(&CommandRequest::verify_address(FIXTURE_PATH_1), &mut screen);
    assert_eq!(response.status, Status::Ok);
    assert_eq!(log.to_json(), expected_screens());

    // one page short: the last Next lands on the last address page, Accept is ignored and the
    // script runs out
    let mut inputs = vec![Input::Next];
    inputs.extend([Input::Page; 3]);
    inputs.extend([Input::Next, Input::Accept]);
    let mut screen = AutomatedScreen::new(Automation::Script(inputs), EventLog::default());
    let response =
        dispatcher.handle(&CommandRequest::verify_address(FIXTURE_PATH_1), &mut screen);
    assert_eq!(response.status, Status::Cancelled);
    assert_eq!(screen.log().len(), 2);
}

#[test]
fn malformed_paths_show_nothing() {
    let dispatcher = dispatcher();
    let log = EventLog::default();
    let mut screen = AutomatedScreen::new(Automation::AcceptAll, log.clone());

    for path in ["", "44'/626'/x", "44'//0", "/44'", "44'/626'/", "4294967296", "m/44'"] {
        for request in [
            CommandRequest::get_public_key(path),
            CommandRequest::verify_address(path),
        ] {
            let response = dispatcher.handle(&request, &mut screen);
            assert_eq!(response.status, Status::MalformedPath, "{path:?}");
            assert_eq!(response.public_key(), None);
        }
    }
    assert!(log.is_empty());
}

#[test]
fn cancel_from_host() {
    let dispatcher = dispatcher();
    let log = EventLog::default();
    let (mut screen, handle) = ChannelScreen::new(log.clone());

    let user = thread::spawn(move || {
        handle.press(Input::Next);
        handle.press(Input::Next);
        handle.cancel();
    });
    let response =
        dispatcher.handle(&CommandRequest::verify_address(FIXTURE_PATH_1), &mut screen);
    user.join().unwrap();
    assert_eq!(response.status, Status::Cancelled);
    assert_eq!(log.len(), 2);
}

#[test]
fn user_on_another_thread() {
    let dispatcher = dispatcher();
    let log = EventLog::default();
    let (mut screen, handle) = ChannelScreen::new(log.clone());

    let user = thread::spawn(move || {
        for _ in 0..6 {
            handle.press(Input::Next);
        }
        handle.press(Input::Accept);
        handle
    });
    let response =
        dispatcher.handle(&CommandRequest::verify_address(FIXTURE_PATH_1), &mut screen);
    let handle = user.join().unwrap();
    assert_eq!(response.status, Status::Ok);
    assert_eq!(response.public_key().unwrap().to_hex(), FIXTURE_PUBKEY_1);
    assert_eq!(log.to_json(), expected_screens());

    // a handle dropped while the user should decide cancels the review
    drop(handle);
    let response =
        dispatcher.handle(&CommandRequest::verify_address(FIXTURE_PATH_1), &mut screen);
    assert_eq!(response.status, Status::Cancelled);
}

#[derive(Default)]
struct PickyScreen {
    pages: Vec<(usize, usize, String)>,
    released: usize,
}

impl Screen for PickyScreen {
    fn render(&mut self, page: &Page<'_>) {
        self.pages
            .push((page.index, page.count, page.text.to_string()));
    }

    fn next_event(&mut self) -> UiEvent {
        match self.pages.last() {
            Some((_, _, text)) if text == "Confirm" => Input::Accept.into(),
            _ => Input::Page.into(),
        }
    }

    fn release(&mut self) {
        self.released += 1;
    }
}

#[test]
fn pages_shown_in_order() {
    let dispatcher = dispatcher();
    let mut screen = PickyScreen::default();

    let response =
        dispatcher.handle(&CommandRequest::verify_address(FIXTURE_PATH_1), &mut screen);
    assert_eq!(response.status, Status::Ok);
    assert_eq!(screen.released, 1);
    assert_eq!(screen.pages.len(), 1 + 5 + 1);
    let address: String = screen.pages[1..6].iter().map(|(_, _, t)| t.as_str()).collect();
    assert_eq!(address, FIXTURE_ADDRESS_1);
    assert!(screen.pages[1..6].iter().all(|(_, count, _)| *count == 5));

    dispatcher.handle(&CommandRequest::get_public_key(FIXTURE_PATH_1), &mut screen);
    assert_eq!(screen.released, 1);
}

#[test]
fn software_signer_round_trip() {
    init_logging();
    let signer = SwSigner::new(TEST_MNEMONIC).unwrap();
    let dispatcher = Dispatcher::new(signer, Config::default());
    let log = EventLog::default();
    let mut screen = AutomatedScreen::new(Automation::AcceptAll, log.clone());

    let get = dispatcher.handle(&CommandRequest::get_public_key("44'/626'/0'"), &mut screen);
    let verify = dispatcher.handle(&CommandRequest::verify_address("44'/626'/0'"), &mut screen);
    assert_eq!(get.status, Status::Ok);
    assert_eq!(get.public_key(), verify.public_key());

    let key = get.public_key().unwrap();
    let events = log.events();
    assert_eq!(
        serde_json::to_value(&events[1]).unwrap()["prompt"],
        json!(key.address().as_str())
    );

    let other = dispatcher.handle(&CommandRequest::get_public_key("44'/626'/1'"), &mut screen);
    assert_ne!(other.public_key(), get.public_key());
}
