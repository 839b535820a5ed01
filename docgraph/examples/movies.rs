use docgraph::{
    query, Computed, Deferred, DispatchKey, MemoryStore, Parser, Predicate, RecentItems, Record,
    Value,
};

fn seed(store: &MemoryStore) {
    let london = store.insert(Record::new("Place", "london").with("city", "London"));
    let kapuskasing = store.insert(Record::new("Place", "kapuskasing").with("city", "Kapuskasing"));
    let ridley = store.insert(
        Record::new("Person", "ridley")
            .with("name", "Ridley Scott")
            .with("birthplace", london),
    );
    let james = store.insert(
        Record::new("Person", "james")
            .with("name", "James Cameron")
            .with("birthplace", kapuskasing),
    );

    for (id, title, year, director) in [
        ("alien", "Alien", 1979, &ridley),
        ("blade-runner", "Blade Runner", 1982, &ridley),
        ("aliens", "Aliens", 1986, &james),
        ("the-abyss", "The Abyss", 1989, &james),
    ] {
        store.insert(
            Record::new("Movie", id)
                .with("title", title)
                .with("year", year)
                .with("director", director.clone()),
        );
    }
}

fn print(value: &Value, indent: usize) {
    let pad = " ".repeat(indent);
    match value {
        Value::List(items) => {
            for item in items {
                println!("{pad}-");
                print(item, indent + 2);
            }
        }
        Value::Map(map) => {
            for (key, value) in map {
                match value {
                    Value::List(_) | Value::Map(_) => {
                        println!("{pad}{key}:");
                        print(value, indent + 2);
                    }
                    Value::Text(text) => println!("{pad}{key}: {text}"),
                    other => println!("{pad}{key}: {other:?}"),
                }
            }
        }
        other => println!("{pad}{other:?}"),
    }
}

fn main() {
    env_logger::init();

    let store = MemoryStore::new();
    seed(&store);

    let parser = Parser::new(store)
        .with_entry_point(RecentItems::key(), RecentItems::new("Movie"))
        .with_override("Person", DispatchKey::new("movieCount"), |c: Computed<'_>| {
            let directed = vec![Predicate::equal_to("director", c.record.to_pointer())];
            Deferred::Pending(c.context.count("Movie", directed).map(Value::from))
        });

    let query = query!(
        class/Movie { title, year, director { name, birthplace { city } } },
        class/Person { name, movieCount, Movie/_director { title } },
        recent/items { title },
    );

    let response = smol::block_on(parser.run(&query));
    for (key, result) in response.iter() {
        println!("{key}");
        match result {
            Ok(value) => print(value, 2),
            Err(error) => println!("  error: {error}"),
        }
    }
}
