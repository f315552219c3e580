use crate::app::App;
use crate::orchestrator::AddressBook;
use crate::state::NewContact;
use crate::ui::render;
use crate::ui::setup::{prompt, Input};
use std::sync::Arc;

const HELP: &str = "\
commands:
  list [term]    contacts, optionally filtered by name or description
  stats          contact counters
  new            add a contact (phone number is encrypted)
  show <id>      open a contact
  decrypt <id>   reveal and verify a contact's phone number
  close          close the open contact
  history        last operations
  check          test contract availability
  refresh        reload contacts from chain
  connect <acct> / disconnect
  quit";

/// Prints each status banner once as it appears.
fn watch_status(book: &AddressBook) {
    let mut rx = book.subscribe();
    crate::utils::spawn_async(async move {
        let mut last = None;
        while rx.changed().await.is_ok() {
            let status = rx.borrow_and_update().status.clone();
            if let Some(s) = status {
                if last.as_ref() != Some(&s) {
                    println!("{}", render::status(&s));
                    last = Some(s);
                }
            }
        }
    });
}

async fn read_draft(lines: &mut Input) -> Option<NewContact> {
    let name = prompt(lines, "Name").await?;
    let phone = prompt(lines, "Phone number").await?;
    let email = prompt(lines, "Email").await?;
    let description = prompt(lines, "Description").await?;
    let priority = prompt(lines, "Priority 1-10 [1]").await?;
    Some(NewContact {
        name,
        phone,
        email,
        description,
        priority: priority.parse().unwrap_or(1),
    })
}

pub async fn run(app: App, lines: &mut Input) {
    let book = app.book.clone();
    watch_status(&book);

    book.connect().await;
    if !book.snapshot().connected {
        println!("No wallet connected; use `connect <account>`.");
    }
    println!("{}", HELP);

    while let Some(line) = prompt(lines, ">").await {
        let (cmd, arg) = match line.split_once(char::is_whitespace) {
            Some((c, a)) => (c, a.trim()),
            None => (line.as_str(), ""),
        };
        if !dispatch(&app, &book, cmd, arg, lines).await {
            break;
        }
    }
}

async fn dispatch(app: &App, book: &Arc<AddressBook>, cmd: &str, arg: &str, lines: &mut Input) -> bool {
    match cmd {
        "" => {}
        "list" | "ls" => println!("{}", render::contact_list(&book.query(arg))),
        "stats" => println!("{}", render::stats(&book.stats())),
        "new" => {
            book.open_form();
            match read_draft(lines).await {
                Some(draft) => {
                    book.edit_draft(|d| *d = draft);
                    if let Some(id) = book.submit_form().await {
                        println!("created {}", id);
                    }
                }
                None => book.close_form(),
            }
        }
        "show" => match book.select_contact(arg) {
            Some(c) => println!("{}", render::contact_detail(&c, None)),
            None => println!("no contact {}", arg),
        },
        "decrypt" => {
            let id = if arg.is_empty() {
                book.snapshot().selection.map(|s| s.contact_id).unwrap_or_default()
            } else {
                arg.to_string()
            };
            book.select_contact(&id);
            if let Some(phone) = book.decrypt_contact(&id).await {
                if let Some(c) = book.contact(&id) {
                    println!("{}", render::contact_detail(&c, Some(phone)));
                }
            }
        }
        "close" => book.close_contact(),
        "history" => println!("{}", render::history(&book.operations())),
        "check" => {
            book.check_availability().await;
        }
        "refresh" => {
            book.refresh().await;
            println!("{}", render::stats(&book.stats()));
        }
        "connect" if !arg.is_empty() => {
            app.session.connect(arg);
            book.connect().await;
        }
        "disconnect" => {
            app.session.disconnect();
            book.disconnect();
        }
        "quit" | "exit" => return false,
        _ => println!("{}", HELP),
    }
    true
}
