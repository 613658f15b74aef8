/*!
Single-value observable signals

A [`Signal`] is a mutable cell holding one value. It can be read at any time, written through a
single entry point, and notifies its listeners whenever a write changes the value.

# Semantics
- Listeners are called synchronously, in registration order, before `write` returns. The same
  listener may be registered several times and is then called once per registration.
- Writing a primitive equal to the stored one is a no-op. Composite values (collections, smart
  pointers, user types) always notify, since they may have been mutated in place.
  See [`SignalValue`] and [`ChangeDetection`].
- An optional transform rewrites every incoming value before it is compared and stored.
- A read-only signal rejects direct writes but still accepts values piped in from upstream.
- `dispose` clears the value and all listeners. A disposed signal never panics; it just stops
  doing anything.
- Listener panics are not caught: they propagate out of `write` and skip the remaining listeners.

# Basic usage

```rust
use relay_signals::*;

let signal = Signal::new(42);
signal.notify(Listener::callback(|new: &i32, old: Option<&i32>, _: &Signal<i32>| {
    println!("changed from {old:?} to {new}")
})).unwrap();
signal.write(43);
// Should print:
// changed from Some(42) to 43
signal.write(43); // equal primitive, nothing printed
```

# Piping

```rust
use relay_signals::*;

let input = Signal::new(0);
let doubled = Signal::builder().value(0).transform(|value: i32, _: Option<&i32>| value * 2).read_only(true).build();
let log = Listener::callback(|value: &i32, _: Option<&i32>, _: &Signal<i32>| println!("doubled: {value}"));

input.pipe(&doubled).unwrap().pipe(log).unwrap();
input.write(21);
assert_eq!(doubled.read(), Some(42));

// read-only: direct writes are rejected
doubled.write(7);
assert_eq!(doubled.read(), Some(42));
```

# Features
- `tokio` (default): tokio channel senders as listeners and the async [`Wait`] porcelain.
*/

mod error;
mod listener;
mod plugin;
pub mod porcelain;
mod signal;
mod value;

pub use error::*;
pub use listener::*;
pub use plugin::*;
pub use porcelain::*;
pub use signal::*;
pub use value::SignalValue;
