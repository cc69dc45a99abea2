use std::env;
use std::process;
use std::time::SystemTime;

use domain::adapters::memory_repo::InMemoryTestimonialRepo;
use domain::service::{LoadNotice, TestimonialStore};
use domain::{NewTestimonial, Rating, Source, Testimonial};

fn print_usage() {
    eprintln!(
        "{}\n\nUsage:\n  domain show [--all]\n  domain submit <name> <content> [--role <role>] [--company <company>] [--rating <1-5>]\n\nNotes:\n  - This demo CLI uses an in-memory repository seeded with two static entries; data is not persisted across runs.",
        domain::about()
    );
}

fn demo_statics() -> Vec<Testimonial> {
    let mk = |id: &str, name: &str, content: &str| Testimonial {
        id: id.to_string(),
        name: name.to_string(),
        role: Some("Product Manager".to_string()),
        company: None,
        content: content.to_string(),
        rating: Rating::default(),
        created_at: SystemTime::UNIX_EPOCH,
        source: Source::Static,
    };
    vec![
        mk("1", "Alex", "Great collaborator"),
        mk("2", "Sam", "Delivered ahead of schedule"),
    ]
}

fn print_testimonials(items: &[Testimonial]) {
    for t in items {
        let role = match (&t.role, &t.company) {
            (Some(r), Some(c)) => format!(" ({} at {})", r, c),
            (Some(r), None) => format!(" ({})", r),
            (None, Some(c)) => format!(" ({})", c),
            (None, None) => String::new(),
        };
        println!(
            "[{}] {}{} {}/5: \"{}\"",
            t.source.as_str(),
            t.name,
            role,
            t.rating.get(),
            t.content
        );
    }
}

fn run() -> Result<(), String> {
    let mut args = env::args().skip(1); // skip program name

    let Some(cmd) = args.next() else {
        print_usage();
        return Ok(());
    };

    let store = TestimonialStore::new(InMemoryTestimonialRepo::new(), demo_statics());
    let outcome = store.load();
    if let Some(LoadNotice::RemoteUnavailable(msg)) = outcome.notice {
        eprintln!("warning: remote testimonials unavailable: {}", msg);
    }

    match cmd.as_str() {
        "show" => {
            match args.next().as_deref() {
                Some("--all") => store.set_show_all(true),
                Some(unk) => return Err(format!("unknown argument: {}", unk)),
                None => {}
            }
            print_testimonials(&store.display());
            Ok(())
        }
        "submit" => {
            let Some(name) = args.next() else {
                return Err("missing <name> for submit".into());
            };
            let Some(content) = args.next() else {
                return Err("missing <content> for submit".into());
            };
            let mut candidate = NewTestimonial::new(name, content);

            // Parse simple flags: --role <val>, --company <val>, --rating <n>
            let rest: Vec<String> = args.collect();
            let mut i = 0;
            while i < rest.len() {
                let flag = rest[i].as_str();
                let Some(val) = rest.get(i + 1).cloned() else {
                    return Err(format!("{} requires a value", flag));
                };
                match flag {
                    "--role" => candidate = candidate.with_role(val),
                    "--company" => candidate = candidate.with_company(val),
                    "--rating" => {
                        let n: u8 = val
                            .parse()
                            .map_err(|_| format!("invalid rating: {}", val))?;
                        let rating = Rating::new(n).map_err(|e| e.to_string())?;
                        candidate = candidate.with_rating(rating);
                    }
                    unk => return Err(format!("unknown argument: {}", unk)),
                }
                i += 2;
            }

            let outcome = store
                .submit(candidate)
                .map_err(|e| format!("submit failed: {}", e))?;
            println!(
                "stored {} ({} testimonials total)",
                outcome.testimonial.id, outcome.merged
            );
            store.set_show_all(true);
            print_testimonials(&store.display());
            Ok(())
        }
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn main() {
    if let Err(msg) = run() {
        eprintln!("error: {}", msg);
        process::exit(1);
    }
}
