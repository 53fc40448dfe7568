use coffee::memo::short_address;
use coffee::{CoffeeConfig, CoffeeSession, CoffeeState, Command, Memo, Screen};
use futures::channel::mpsc;
use leptos::*;
use leptos_meta::*;
use wasm_bindgen::prelude::*;

mod contract;
mod rpc;
mod wallet;

use contract::InjectedContract;
use wallet::InjectedWallet;

/// Config overrides baked in at build time, e.g.
/// `COFFEE_CONTRACT_ADDRESS=0x... trunk build`.
fn build_time_var(key: &str) -> Option<String> {
    let value = match key {
        "COFFEE_CONTRACT_ADDRESS" => option_env!("COFFEE_CONTRACT_ADDRESS"),
        "COFFEE_PRICE_WEI" => option_env!("COFFEE_PRICE_WEI"),
        "MEMO_POLL_INTERVAL_MS" => option_env!("MEMO_POLL_INTERVAL_MS"),
        "RECEIPT_TIMEOUT_SECS" => option_env!("RECEIPT_TIMEOUT_SECS"),
        _ => None,
    };
    value.map(str::to_string)
}

fn load_config() -> CoffeeConfig {
    CoffeeConfig::from_lookup(build_time_var).unwrap_or_else(|e| {
        log::error!("ignoring build-time overrides: {e}");
        CoffeeConfig::default()
    })
}

/// `From: <name> at <time>` line under a memo.
fn memo_caption(memo: &Memo) -> String {
    format!("From: {} at {}", memo.name, memo.timestamp.to_rfc2822())
}

/// Main application component.
///
/// Owns one [`CoffeeSession`] for the lifetime of the page. The session runs
/// as a local task; the view sends it [`Command`]s and re-renders from the
/// state snapshots it publishes.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    let config = load_config();
    let price = config.price_label();

    let (state, set_state) = create_signal(CoffeeState::default());
    let (commands, command_rx) = mpsc::unbounded::<Command>();

    let session = CoffeeSession::new(
        InjectedWallet,
        InjectedContract::new(config.clone()),
        config,
    );
    spawn_local(async move {
        session
            .run(command_rx, move |snapshot| set_state.set(snapshot.clone()))
            .await;
    });

    let commands = store_value(commands);
    let send = Callback::new(move |command: Command| {
        commands.with_value(|tx| {
            if tx.unbounded_send(command).is_err() {
                log::warn!("session already closed");
            }
        });
    });

    // Closing the command channel ends the session loop, which releases the
    // memo subscription.
    on_cleanup(move || {
        commands.try_with_value(|tx| tx.close_channel());
    });

    let connected = move || state.with(|s| s.screen() == Screen::Tipping);

    view! {
        <Title text="Buy Isaac a Coffee!" />
        <Meta name="description" content="Tipping site" />
        <Link rel="icon" href="/favicon.ico" />
        <Stylesheet href="/style.css" />

        <div class="container">
            <main class="main">
                <h1 class="title">"Buy Isaac a Coffee"</h1>

                <Show
                    when=connected
                    fallback=move || view! { <ConnectButton send=send /> }
                >
                    <AccountBar state=state send=send />
                    <CoffeeForm state=state send=send price=price.clone() />
                </Show>
            </main>

            <Show when=connected fallback=|| ()>
                <MemoFeed state=state />
            </Show>

            <Footer />
        </div>
    }
}

/// Shown while no account is connected.
#[component]
fn ConnectButton(send: Callback<Command>) -> impl IntoView {
    view! {
        <button class="btn btn-primary" on:click=move |_| send.call(Command::Connect)>
            "Connect MetaMask"
        </button>
    }
}

/// Connected address and a disconnect control.
#[component]
fn AccountBar(state: ReadSignal<CoffeeState>, send: Callback<Command>) -> impl IntoView {
    let short = move || {
        state
            .with(|s| s.account().map(|a| short_address(&a)))
            .unwrap_or_default()
    };

    view! {
        <div class="wallet-info">
            <span class="wallet-address">{short}</span>
            <button class="btn btn-secondary" on:click=move |_| send.call(Command::Disconnect)>
                "Disconnect"
            </button>
        </div>
    }
}

#[component]
fn CoffeeForm(
    state: ReadSignal<CoffeeState>,
    send: Callback<Command>,
    price: String,
) -> impl IntoView {
    view! {
        <form class="coffee-form">
            <div>
                <label for="name">"Name:"</label>
                <br />
                <input
                    id="name"
                    type="text"
                    class="input"
                    placeholder="input your name"
                    prop:value=move || state.with(|s| s.form().name.clone())
                    on:input=move |ev| send.call(Command::SetName(event_target_value(&ev)))
                />
            </div>
            <br />

            <div>
                <label for="message">"Message:"</label>
                <br />
                <textarea
                    id="message"
                    class="input"
                    rows=3
                    placeholder="Send Isaac a message"
                    prop:value=move || state.with(|s| s.form().message.clone())
                    on:input=move |ev| send.call(Command::SetMessage(event_target_value(&ev)))
                />
            </div>
            <div>
                <button
                    type="button"
                    class="btn btn-primary"
                    on:click=move |_| send.call(Command::BuyCoffee)
                >
                    {format!("Buy 1 Coffee for {price}")}
                </button>
            </div>
        </form>
    }
}

/// Memos in arrival order: history first, then live ones.
#[component]
fn MemoFeed(state: ReadSignal<CoffeeState>) -> impl IntoView {
    let memos = move || {
        state.with(|s| s.memos().iter().cloned().enumerate().collect::<Vec<_>>())
    };

    view! {
        <h1>"memos received"</h1>
        <For
            each=memos
            key=|(idx, memo)| (*idx, memo.address, memo.timestamp)
            children=move |(_, memo)| view! { <MemoCard memo=memo /> }
        />
    }
}

#[component]
fn MemoCard(memo: Memo) -> impl IntoView {
    view! {
        <div class="memo">
            <p class="memo-message">{format!("\"{}\"", memo.message)}</p>
            <p>{memo_caption(&memo)}</p>
        </div>
    }
}

#[component]
fn Footer() -> impl IntoView {
    view! {
        <footer class="footer">
            <a
                href="https://alchemy.com/?a=roadtoweb3weektwo"
                target="_blank"
                rel="noopener noreferrer"
            >
                "Created by @thatguyintech for Alchemy's Road to Web3 lesson two!"
            </a>
        </footer>
    }
}

/// Initialize the app
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Debug) {
        web_sys::console::error_1(&format!("console_log init failed: {e}").into());
    }
    mount_to_body(|| view! { <App /> });
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, U256};

    #[test]
    fn test_memo_caption() {
        let memo = Memo::from_parts(
            Address::repeat_byte(0xab),
            U256::from(1000),
            "bob".into(),
            "nice".into(),
        )
        .unwrap();
        let caption = memo_caption(&memo);
        assert!(caption.starts_with("From: bob at "));
        assert!(caption.contains("1970"));
    }

    #[test]
    fn test_build_time_vars_ignore_unknown_keys() {
        assert_eq!(build_time_var("EVM_PRIVATE_KEY"), None);
    }

    #[test]
    fn test_load_config_defaults_to_deployment() {
        // No overrides are set when tests are built.
        if option_env!("COFFEE_CONTRACT_ADDRESS").is_none() {
            assert_eq!(
                load_config().contract_address,
                coffee::CONTRACT_ADDRESS
            );
        }
    }
}
