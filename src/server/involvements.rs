//! The static list of people connected to the case, served at
//! `/v1/involvements`.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InvolvementType {
    #[serde(rename = "accused")]
    Accused,
    #[serde(rename = "victim")]
    Victim,
    #[serde(rename = "alleged victim")]
    AllegedVictim,
    #[serde(rename = "accusing")]
    Accusing,
    #[serde(rename = "suspected")]
    Suspected,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub name: &'static str,
    pub involvement_type: InvolvementType,
    pub details: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<&'static str>,
}

const fn person(
    name: &'static str,
    involvement_type: InvolvementType,
    details: &'static str,
) -> Person {
    Person {
        name,
        involvement_type,
        details,
        image_url: None,
    }
}

use InvolvementType::*;

pub const INVOLVEMENTS: &[Person] = &[
    person(
        "Sean 'Diddy' Combs",
        Accused,
        "Facing multiple allegations including sexual assault, sex trafficking, racketeering, and abuse of various individuals over decades.",
    ),
    person(
        "Aaron Hall",
        Accused,
        "Accused by Liza Gardner of coercion into sexual acts alongside Combs in an incident in 1990.",
    ),
    person(
        "Harve Pierre",
        Accused,
        "Named in lawsuits for grooming and alleged involvement in sexual assault and trafficking alongside Combs.",
    ),
    person(
        "Cuba Gooding Jr.",
        Accused,
        "Accused of sexually harassing Rodney Jones Jr., allegedly groomed by Combs to 'pass him off' to Gooding.",
    ),
    person(
        "Justin Dior Combs",
        Accused,
        "Diddy's son, alleged to have solicited sex workers, witnessed abusive incidents, and engaged in incidents involving firearms.",
    ),
    person(
        "Jacob Arabo (Jacob the Jeweler)",
        Accused,
        "Accused by Adria English of non-consensual acts at Combs' parties, allegedly organized by Combs.",
    ),
    person(
        "Yung Miami",
        Suspected,
        "Mentioned as allegedly supplying drugs to Combs and being financially tied to him as part of an alleged trafficking network.",
    ),
    person(
        "Stevie J",
        Suspected,
        "Allegedly recruited sex workers and participated in 'freak-offs' associated with Combs' events.",
    ),
    person(
        "Kalenna Harper",
        Victim,
        "Witnessed abusive behavior by Combs towards other individuals, pressured to work under abusive conditions.",
    ),
    person(
        "Cassie Ventura",
        Victim,
        "Filed a lawsuit accusing Combs of abuse, coercion, and physical violence throughout their relationship.",
    ),
    person(
        "Rachel Kennedy",
        Victim,
        "Accused Combs of controlling behavior and recounted incidents of violence involving him.",
    ),
    person(
        "Jane Doe",
        AllegedVictim,
        "Filed a lawsuit claiming she was raped by Combs and another celebrity at age 13 during an MTV after-party.",
    ),
    person(
        "Adria English",
        Victim,
        "Claims she was forced into non-consensual acts at Combs' parties while working as a go-go dancer.",
    ),
    person(
        "Jennifer Lopez",
        Suspected,
        "While not directly implicated, her past relationship with Combs has led to mentions in the scandal.",
    ),
    person(
        "Jimmy Iovine",
        Accused,
        "Allegedly witnessed Combs assault Ventura but did not intervene; connected to Interscope deal with Bad Boy Records.",
    ),
    person(
        "Lucian Grainge",
        Accused,
        "Initially implicated in alleged racketeering with Combs but later dismissed from the case; has denied all involvement.",
    ),
    person(
        "Kim Porter",
        AllegedVictim,
        "Diddy's former partner who reportedly endured abusive incidents; later reconciled with him before her death.",
    ),
    person(
        "Rodney Jones Jr.",
        Victim,
        "Alleged that Combs groomed him and exposed him to inappropriate situations with other celebrities.",
    ),
];
