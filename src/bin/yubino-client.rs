use clap::{Parser, Subcommand};
use rand::Rng;
use tokio::net::TcpStream;

use yubino::client::{Client, RelyingParty, application_id, client_data_hash};

#[derive(Parser, Debug)]
#[command(name = "yubino-client", about = "Talk to a yubino emulator")]
struct Cli {
    #[arg(long, default_value = "127.0.0.1:4242")]
    connect: String,
    #[arg(long, default_value = "http://localhost:8000")]
    relying_party: String,
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// List stored credentials.
    List,
    /// Create a credential for APP.
    MakeCredential { app: String },
    /// Sign a challenge with the credential for APP.
    GetAssertion {
        app: String,
        /// Hex challenge; 32 random bytes when omitted.
        challenge: Option<String>,
    },
    /// Erase every credential.
    Reset,
    /// Fetch the relying party's index page.
    Index,
    /// Register USER on the relying party with a new device credential.
    Register { user: String },
    /// Log USER in to the relying party, then show the index page.
    Login { user: String },
}

fn random_challenge() -> String {
    let bytes: [u8; 32] = rand::thread_rng().r#gen();
    hex::encode(bytes)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Cmd::Index = cli.command {
        let rp = RelyingParty::new(&cli.relying_party)?;
        println!("{}", rp.index().await?);
        return Ok(());
    }

    let stream = TcpStream::connect(&cli.connect)
        .await
        .map_err(|e| anyhow::anyhow!("cannot connect to {}: {e}", cli.connect))?;
    stream.set_nodelay(true)?;
    let mut client = Client::new(stream);

    match cli.command {
        Cmd::List => {
            let listed = client.list_credentials().await?;
            println!("{} credential(s)", listed.len());
            for entry in listed {
                println!(
                    "{}  {}",
                    hex::encode(entry.credential_id),
                    hex::encode(entry.application_id)
                );
            }
        }
        Cmd::MakeCredential { app } => {
            eprintln!("Touch the button to approve");
            let made = client.make_credential(&application_id(&app)).await?;
            println!("credential_id: {}", hex::encode(made.credential_id));
            println!("public_key:    {}", hex::encode(made.public_key.0));
        }
        Cmd::GetAssertion { app, challenge } => {
            let challenge = match challenge {
                Some(c) => {
                    hex::decode(&c).map_err(|e| anyhow::anyhow!("invalid challenge: {e}"))?;
                    c
                }
                None => random_challenge(),
            };
            let client_data = client_data_hash(&challenge, &app);
            eprintln!("Touch the button to approve");
            let assertion = client
                .get_assertion(&application_id(&app), &client_data)
                .await?;
            println!("challenge:     {challenge}");
            println!("client_data:   {}", hex::encode(client_data));
            println!("credential_id: {}", hex::encode(assertion.credential_id));
            println!("signature:     {}", hex::encode(assertion.signature.0));
        }
        Cmd::Reset => {
            eprintln!("Touch the button to approve");
            client.reset().await?;
            println!("All credentials erased");
        }
        Cmd::Index => {}
        Cmd::Register { user } => {
            let rp = RelyingParty::new(&cli.relying_party)?;
            eprintln!("Touch the button to approve");
            rp.register(&mut client, &user).await?;
            println!("done");
        }
        Cmd::Login { user } => {
            let mut rp = RelyingParty::new(&cli.relying_party)?;
            eprintln!("Touch the button to approve");
            rp.login(&mut client, &user).await?;
            println!("{}", rp.index().await?);
            rp.logout()?;
            println!("done");
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}
